use std::ffi::OsStr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "invalid log format '{other}', expected one of: human, json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct RunArgs {
    #[arg(help = "Directory holding the person, interest and knows record files")]
    pub data_dir: PathBuf,

    #[arg(help = "Query batch file, one queryId|a1|a2|a3|a4|d1|d2 line per query")]
    pub query_file: PathBuf,

    #[arg(help = "Results file; omit or pass '-' to write to stdout")]
    pub results_file: Option<PathBuf>,

    #[arg(
        long,
        default_value = "pipe",
        value_parser = parse_output_format,
        help = "Result format: pipe or json"
    )]
    pub format: OutputFormat,

    #[arg(
        long,
        conflicts_with = "sequential",
        help = "Split each query's anchor candidates across worker threads"
    )]
    pub parallel: bool,

    #[arg(long, help = "Evaluate each query on the calling thread")]
    pub sequential: bool,

    #[arg(
        long,
        help = "Worker thread count for parallel evaluation (0 uses the rayon default)"
    )]
    pub threads: Option<usize>,
}

impl RunArgs {
    /// `None` for stdout.
    pub fn results_path(&self) -> Option<&PathBuf> {
        self.results_file
            .as_ref()
            .filter(|path| path.as_os_str() != OsStr::new("-"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct InspectArgs {
    #[arg(help = "Directory holding the person, interest and knows record files")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Evaluate a query batch against a dataset and write ranked triangles
    Run(RunArgs),
    /// Load a dataset and print record and index statistics
    Inspect(InspectArgs),
    /// Write the default .tricrunch/config.toml if it does not exist
    InitConfig,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Ranked social-graph triangle queries")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Workspace root holding .tricrunch/config.toml"
    )]
    pub workspace: PathBuf,

    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = parse_log_format,
        help = "Log format: human or json"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

pub fn parse_cli() -> Cli {
    let mut args: Vec<_> = std::env::args_os().collect();
    if args.get(1).is_some_and(|arg| arg == OsStr::new("--")) {
        args.remove(1);
    }

    Cli::parse_from(args)
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse()
}
