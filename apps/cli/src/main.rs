//! RemoteContent CLI: fetch remote markup and rewrite it for embedding.
//!
//! Resolves a remote path against the configured origin, fetches it once and
//! rewrites relative `src`, `srcset` and `href` URLs so the markup can be
//! dropped into a page served from another origin.

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
