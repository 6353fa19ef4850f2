use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tricrunch_config::{
    EvaluationMode, TricrunchConfig, config_path, ensure_workspace_config, load_workspace_config,
    validate_config,
};
use tricrunch_core::{QuerySpec, parse_query_batch};
use tricrunch_query::{CandidateIndex, Executor};
use tricrunch_store::load_dataset;

use crate::cli::{InspectArgs, RunArgs};
use crate::output::WriterSink;
use crate::runner::{BatchSummary, QueryRunner};

/// Loads the workspace config, logging every validation warning.
pub fn load_config(workspace: &Path) -> Result<TricrunchConfig> {
    let config = load_workspace_config(workspace).with_context(|| {
        format!(
            "failed to load workspace config at {}",
            config_path(workspace).display()
        )
    })?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "{}", warning.message);
    }
    Ok(config)
}

pub fn read_query_file(path: &Path) -> Result<Vec<QuerySpec>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read query file {}", path.display()))?;
    parse_query_batch(&text)
        .with_context(|| format!("invalid query batch in {}", path.display()))
}

/// Flags on the command line win over the config file.
pub fn resolve_executor(args: &RunArgs, config: &TricrunchConfig) -> Result<Executor> {
    let mode = if args.parallel {
        EvaluationMode::Parallel
    } else if args.sequential {
        EvaluationMode::Sequential
    } else {
        config.evaluation.mode
    };
    let threads = args.threads.unwrap_or(config.evaluation.threads);
    Executor::new(mode, threads)
        .with_context(|| format!("failed to build a worker pool with {threads} threads"))
}

pub fn load_index(data_dir: &Path, config: &TricrunchConfig) -> Result<CandidateIndex> {
    let store = load_dataset(data_dir, &config.dataset)
        .with_context(|| format!("failed to load dataset from {}", data_dir.display()))?;
    CandidateIndex::build(&store).context("failed to build candidate index")
}

/// The whole query batch is parsed, and the dataset loaded, before the
/// results file is created.
pub fn run_batch(workspace: &Path, args: &RunArgs) -> Result<BatchSummary> {
    let config = load_config(workspace)?;
    let specs = read_query_file(&args.query_file)?;
    let executor = resolve_executor(args, &config)?;
    let index = load_index(&args.data_dir, &config)?;

    tracing::info!(
        queries = specs.len(),
        mode = executor.mode().as_str(),
        format = args.format.as_str(),
        "starting query batch"
    );

    let runner = QueryRunner::new(&index, executor);
    let summary = match args.results_path() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create results file {}", path.display()))?;
            let mut sink = WriterSink::new(BufWriter::new(file), args.format);
            runner.run(&specs, &mut sink)?
        }
        None => {
            let stdout = io::stdout();
            let mut sink = WriterSink::new(stdout.lock(), args.format);
            runner.run(&specs, &mut sink)?
        }
    };

    tracing::info!(
        queries = summary.queries,
        rows = summary.rows,
        empty_queries = summary.empty_queries,
        "query batch finished"
    );
    Ok(summary)
}

pub fn inspect_dataset(workspace: &Path, args: &InspectArgs, out: &mut dyn Write) -> Result<()> {
    let config = load_config(workspace)?;
    let store = load_dataset(&args.data_dir, &config.dataset)
        .with_context(|| format!("failed to load dataset from {}", args.data_dir.display()))?;
    let index = CandidateIndex::build(&store).context("failed to build candidate index")?;

    let stats = store.stats();
    writeln!(out, "persons\t{}", stats.persons)?;
    writeln!(out, "interest_rows\t{}", stats.interest_rows)?;
    writeln!(out, "dropped_interest_rows\t{}", stats.dropped_interest_rows)?;
    writeln!(out, "knows_rows\t{}", stats.knows_rows)?;
    writeln!(out, "dropped_knows_rows\t{}", stats.dropped_knows_rows)?;
    writeln!(out, "self_loops\t{}", stats.self_loops)?;
    writeln!(out, "tags\t{}", index.tag_count())?;
    writeln!(out, "same_city_links\t{}", index.same_city_link_count())?;
    Ok(())
}

pub fn init_config(workspace: &Path, out: &mut dyn Write) -> Result<()> {
    let path = config_path(workspace);
    let existed = path.exists();
    ensure_workspace_config(workspace)
        .with_context(|| format!("failed to write workspace config at {}", path.display()))?;

    if existed {
        writeln!(out, "config already present at {}", path.display())?;
    } else {
        writeln!(out, "wrote default config to {}", path.display())?;
    }
    Ok(())
}
