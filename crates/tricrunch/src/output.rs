use std::io::{self, Write};

use tricrunch_core::{QuerySpec, ResultRow};

use crate::runner::ResultSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `queryId|score|p1|p2|p3`
    #[default]
    Pipe,
    /// One JSON object per row.
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pipe" => Ok(Self::Pipe),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid output format '{other}', expected one of: pipe, json"
            )),
        }
    }
}

pub fn write_rows(
    rows: &[ResultRow],
    format: OutputFormat,
    out: &mut dyn Write,
) -> io::Result<()> {
    for row in rows {
        match format {
            OutputFormat::Pipe => writeln!(
                out,
                "{}|{}|{}|{}|{}",
                row.query_id, row.score, row.p1, row.p2, row.p3
            )?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }
    }

    Ok(())
}

/// Renders each query's rows to any writer as soon as they are ranked.
pub struct WriterSink<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for WriterSink<W> {
    fn write_query(&mut self, _spec: &QuerySpec, rows: &[ResultRow]) -> io::Result<()> {
        write_rows(rows, self.format, &mut self.out)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(score: u32, p1: u64, p2: u64, p3: u64) -> ResultRow {
        ResultRow {
            query_id: 12,
            score,
            p1,
            p2,
            p3,
        }
    }

    #[test]
    fn pipe_format_writes_five_fields_per_row() {
        let mut out = Vec::new();
        write_rows(&[row(5, 1, 2, 3), row(4, 1, 2, 9)], OutputFormat::Pipe, &mut out)
            .expect("write rows");

        let rendered = String::from_utf8(out).expect("utf8 output");
        assert_eq!(rendered, "12|5|1|2|3\n12|4|1|2|9\n");
    }

    #[test]
    fn json_format_writes_one_object_per_line() {
        let mut out = Vec::new();
        write_rows(&[row(5, 1, 2, 3)], OutputFormat::Json, &mut out).expect("write rows");

        let rendered = String::from_utf8(out).expect("utf8 output");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("parse json line");
        assert_eq!(parsed["query_id"], 12);
        assert_eq!(parsed["score"], 5);
        assert_eq!(parsed["p3"], 3);
    }

    #[test]
    fn empty_result_set_writes_nothing() {
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Pipe);
        let spec = QuerySpec {
            id: 1,
            anchor_tag: 1,
            score_tags: [2, 3, 4],
            window: tricrunch_core::BirthdayWindow::new(101, 1231),
        };

        sink.write_query(&spec, &[]).expect("write empty query");
        sink.finish().expect("flush");

        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn output_format_parses_known_names() {
        assert_eq!("pipe".parse::<OutputFormat>(), Ok(OutputFormat::Pipe));
        assert_eq!(" json ".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("csv".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().as_str(), "pipe");
    }
}
