use std::io;
use std::time::Instant;

use anyhow::{Context, Result};
use tricrunch_core::{QuerySpec, ResultRow};
use tricrunch_query::{CandidateIndex, Executor};

/// Destination for ranked rows, called once per query in input order.
pub trait ResultSink {
    fn write_query(&mut self, spec: &QuerySpec, rows: &[ResultRow]) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub queries: usize,
    pub rows: usize,
    pub empty_queries: usize,
}

pub struct QueryRunner<'a> {
    index: &'a CandidateIndex,
    executor: Executor,
}

impl<'a> QueryRunner<'a> {
    pub fn new(index: &'a CandidateIndex, executor: Executor) -> Self {
        Self { index, executor }
    }

    pub fn run(&self, specs: &[QuerySpec], sink: &mut dyn ResultSink) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for spec in specs {
            let started = Instant::now();
            tracing::info!(query_id = spec.id, "processing query");

            let rows = self.executor.evaluate(self.index, spec);
            sink.write_query(spec, &rows)
                .with_context(|| format!("failed to write results for query {}", spec.id))?;

            tracing::info!(
                query_id = spec.id,
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "query finished"
            );
            summary.queries += 1;
            summary.rows += rows.len();
            if rows.is_empty() {
                summary.empty_queries += 1;
            }
        }

        sink.finish().context("failed to flush results")?;
        Ok(summary)
    }
}
