use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::memory::{cmd_memory, MemoryArgs};
use super::run::{cmd_run, RunArgs};

#[derive(Parser)]
#[command(
    name = "webpilot",
    version,
    about = "Vision-driven browser agent with cross-run memory"
)]
pub struct CliArgs {
    /// Log filter when RUST_LOG is unset, e.g. `info` or `webpilot=debug`.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a task in the browser.
    Run(RunArgs),
    /// Inspect the persisted memory store.
    Memory(MemoryArgs),
}

/// Parse arguments, initialize logging, dispatch. Returns the process exit
/// code.
pub async fn run() -> Result<i32> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Memory(args) => cmd_memory(args).await,
    }
}

fn init_logging(fallback: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
