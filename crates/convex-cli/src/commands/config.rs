//! Config command implementation.
//!
//! Prints, writes and validates experiment configuration files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use convex_config::ExperimentConfig;

use super::load_experiment;
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{print_header, print_output, print_success, KeyValue};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the active experiment configuration (TOML, or JSON with --format json)
    Show,

    /// Check a configuration file and report its key settings
    Validate(ValidateArgs),

    /// Write the default experiment configuration to a file
    Init(InitArgs),
}

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file (.toml or .json)
    pub path: PathBuf,
}

/// Arguments for the init subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination file; the extension selects TOML or JSON
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Executes the config command.
pub fn execute(args: ConfigArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(config_path, format),
        ConfigCommand::Validate(args) => validate(&args.path, format),
        ConfigCommand::Init(args) => init(&args),
    }
}

fn show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_experiment(config_path)?;
    let text = match format {
        OutputFormat::Json => config.to_json_string()?,
        _ => config.to_toml_string()?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

fn validate(path: &Path, format: OutputFormat) -> Result<()> {
    let config = load_experiment(Some(path))?;

    let summary = vec![
        KeyValue::new("Name", config.name.clone()),
        KeyValue::new("Mean Reversion", config.simulator.mean_reversion.to_string()),
        KeyValue::new("Volatility", config.simulator.volatility.to_string()),
        KeyValue::new("Offsets", config.simulator.offsets.len().to_string()),
        KeyValue::new("Samples", config.simulator.num_samples.to_string()),
        KeyValue::new("VAE Alpha", config.vae.alpha.to_string()),
        KeyValue::new("Latent Dim", config.vae.latent_dim.to_string()),
        KeyValue::new("Iterations", config.training.iterations.to_string()),
    ];

    if format == OutputFormat::Table {
        print_success(&format!("{} is valid", path.display()));
        print_header("Experiment");
    }
    print_output(&summary, format)
}

fn init(args: &InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(CliError::FileExists(args.path.display().to_string()).into());
    }

    let config = ExperimentConfig::worked_example();
    let is_json = args
        .path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let text = if is_json {
        config.to_json_string()?
    } else {
        config.to_toml_string()?
    };

    std::fs::write(&args.path, text)
        .with_context(|| format!("failed to write {}", args.path.display()))?;
    print_success(&format!("wrote {}", args.path.display()));
    Ok(())
}
