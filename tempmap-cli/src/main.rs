//! Binary crate for the `tempmap` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - The interactive dashboard loop and configuration prompts
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod interactive;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();

    let default_filter = if cmd.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    cmd.run().await
}
