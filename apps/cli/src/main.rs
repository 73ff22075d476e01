//! Newsdesk CLI: feeds in, summarized news page out.
//!
//! Polls a fixed set of RSS/Atom feeds, asks an LLM for one HTML article per
//! entry, and splices the articles into a page stored in a GitHub repository.

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
