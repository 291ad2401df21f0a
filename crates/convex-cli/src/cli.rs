//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{ConfigArgs, SimulateArgs, TrainArgs};

/// Convex VAE - synthetic yield curves and variational autoencoders
#[derive(Parser)]
#[command(name = "convex-vae")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Experiment configuration file (.toml or .json); defaults to the built-in worked example
    #[arg(short, long, global = true, env = "CONVEX_VAE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Simulate zero curves and report their moments
    Simulate(SimulateArgs),

    /// Train a plain or conditional VAE on simulated curves and generate new ones
    Train(TrainArgs),

    /// Inspect, create and validate experiment configurations
    Config(ConfigArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the values)
    Minimal,
}
