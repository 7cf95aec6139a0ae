//! Binary crate for the `airq` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and candidate selection
//! - Human-friendly rendering of the view state

use std::{env, io};

use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

mod cli;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cmd = cli::Cli::parse();
    cmd.run().await
}

/// Logs go to stderr so they never interleave with rendered output.
///
/// `RUST_LOG` wins when set; otherwise `AIRQ_LOG_LEVEL` picks the level for
/// the airq crates (default `warn`).
fn init_tracing() {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AIRQ_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("error") => "error",
            _ => "warn",
        };
        EnvFilter::new(format!("warn,airq_core={level},airq_cli={level}"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}
