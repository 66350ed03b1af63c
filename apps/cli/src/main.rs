//! docpup CLI: pull documentation out of git repositories and index it
//! for coding agents.
//!
//! Sparse-checks-out each configured repository, optionally converts it to
//! Markdown, copies the selected files into the project and writes a compact
//! one-line index per repository.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
