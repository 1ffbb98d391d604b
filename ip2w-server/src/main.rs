//! Binary crate for the `ip2w` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup from the loaded configuration
//! - Hosting the core handler behind an HTTP server

use clap::Parser;

mod cli;
mod logging;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
