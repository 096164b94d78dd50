//! TopicTree CLI — reconstruct topic trees from rendered mind maps.
//!
//! Fetches diagram pages (or reads saved ones) and prints the implied
//! hierarchy as JSON.

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
