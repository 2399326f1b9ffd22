mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeatlas::AtlasError;

use crate::cli::{Cli, Commands};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeatlas=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<AtlasError>()
            .map(AtlasError::exit_code)
            .unwrap_or(2);
        std::process::exit(code);
    }
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            max_processes,
            no_content,
        } => {
            cli::analyze(&path, max_processes, no_content)?;
        }
        Commands::Stats { path } => {
            cli::stats(&path)?;
        }
    }

    Ok(())
}
