use anyhow::{Context, Result};
use tricrunch::cli::{Cli, Commands, parse_cli};
use tricrunch::commands::{init_config, inspect_dataset, run_batch};
use tricrunch::logging::init_tracing;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.log_format)?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    match &cli.command {
        Commands::Run(args) => {
            run_batch(&workspace, args)?;
        }
        Commands::Inspect(args) => {
            let mut out = std::io::stdout();
            inspect_dataset(&workspace, args, &mut out)?;
        }
        Commands::InitConfig => {
            let mut out = std::io::stdout();
            init_config(&workspace, &mut out)?;
        }
    }

    Ok(())
}
