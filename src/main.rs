//! Podmix CLI - Podcast Audio Composition
//!
//! Command-line interface for the podmix composition engine.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use podmix::cli::commands;
use podmix::cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("podmix={}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Podmix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Podmix v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Mix(args) => {
            let output = commands::mix(&args).with_context(|| {
                format!("failed to mix {}", args.narration.display())
            })?;
            info!("Wrote {}", output.display());
            Ok(())
        }
        Commands::Preset { strategy } => Ok(commands::preset(strategy)?),
        Commands::Probe { path } => {
            commands::probe(&path).with_context(|| format!("failed to probe {}", path.display()))
        }
    }
}
