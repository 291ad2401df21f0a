//! Convex VAE CLI - simulate yield curves and train generative models on them.
//!
//! # Usage
//!
//! ```bash
//! # Moment statistics of 1024 simulated curves
//! convex-vae simulate
//!
//! # First five simulated curves as CSV
//! convex-vae simulate --curves 5 --format csv
//!
//! # Train the plain VAE and generate ten curves
//! convex-vae train --iterations 500 --generate 10
//!
//! # Train the conditional VAE on (rate, time-to-maturity) pairs
//! convex-vae train --conditional
//!
//! # Print or write the default experiment configuration
//! convex-vae config show
//! convex-vae config init experiment.toml
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet);

    let format = cli.format;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Simulate(args) => commands::simulate::execute(args, config_path, format)?,
        Commands::Train(args) => commands::train::execute(args, config_path, format)?,
        Commands::Config(args) => commands::config::execute(args, config_path, format)?,
    }

    Ok(())
}

/// Logs go to stderr so that JSON and CSV output stay machine-readable.
fn init_tracing(quiet: bool) {
    let filter = if quiet {
        "warn".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,convex=info".into())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
