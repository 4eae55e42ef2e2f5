// Entrypoint for the CLI application.
// - Keeps `main` small: initialize logging, parse flags, dispatch.
// - Returns `anyhow::Result` so every failure exits non-zero with its
//   message; nothing is swallowed.

use admatch_cli::cli::{Cli, Commands};
use admatch_cli::{status, upload};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload(args) => upload::run(&args)?,
        Commands::CheckJob(args) => status::run(&args)?,
    }
    Ok(())
}
