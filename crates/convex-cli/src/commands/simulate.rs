//! Simulate command implementation.
//!
//! Draws zero curves from the one-factor model and reports either the curves
//! themselves or their per-offset moments next to the closed-form values.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tabled::Tabled;

use convex_config::Validate;
use convex_curves::{CurveResult, HullWhiteSimulator};

use super::{load_experiment, offset_labels, parse_offsets};
use crate::cli::OutputFormat;
use crate::output::{format_rate, format_variance, print_header, print_matrix, print_output};

/// Arguments for the simulate command.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of curves to draw
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Observation time t in years
    #[arg(short = 't', long)]
    pub observation_time: Option<f64>,

    /// Comma-separated maturity offsets in years (e.g. 1,2,5,10)
    #[arg(long)]
    pub offsets: Option<String>,

    /// Mean-reversion speed a
    #[arg(short = 'a', long)]
    pub mean_reversion: Option<f64>,

    /// Short-rate volatility sigma
    #[arg(short = 's', long)]
    pub volatility: Option<f64>,

    /// Print the first N curves instead of moment statistics
    #[arg(long, value_name = "N")]
    pub curves: Option<usize>,
}

/// Per-offset moment comparison.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct OffsetStats {
    #[tabled(rename = "Offset")]
    pub offset: String,
    #[tabled(rename = "Mean")]
    #[serde(skip)]
    pub mean_display: String,
    #[tabled(rename = "Expected")]
    #[serde(skip)]
    pub expected_mean_display: String,
    #[tabled(rename = "Variance")]
    #[serde(skip)]
    pub variance_display: String,
    #[tabled(rename = "Expected Var")]
    #[serde(skip)]
    pub expected_variance_display: String,
    #[tabled(skip)]
    pub mean: f64,
    #[tabled(skip)]
    pub expected_mean: f64,
    #[tabled(skip)]
    pub variance: f64,
    #[tabled(skip)]
    pub expected_variance: f64,
}

/// Executes the simulate command.
pub fn execute(args: SimulateArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let mut config = load_experiment(config_path)?.simulator;

    if let Some(n) = args.samples {
        config.num_samples = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(t) = args.observation_time {
        config.observation_time = t;
    }
    if let Some(offsets) = args.offsets.as_deref() {
        config.offsets = parse_offsets(offsets)?;
    }
    if let Some(a) = args.mean_reversion {
        config.mean_reversion = a;
    }
    if let Some(sigma) = args.volatility {
        config.volatility = sigma;
    }
    config.validate_or_error()?;

    let simulator = HullWhiteSimulator::from_config(&config)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let curves = simulator.simulate_config(&config, &mut rng)?;

    if let Some(count) = args.curves {
        let rows: Vec<Vec<f64>> = curves.to_rows().into_iter().take(count).collect();
        let title = format!(
            "Simulated zero curves ({} of {}, t = {})",
            rows.len(),
            curves.num_samples(),
            curves.observation_time()
        );
        return print_matrix(&title, &offset_labels(curves.offsets()), &rows, format);
    }

    let t = curves.observation_time();
    let labels = offset_labels(curves.offsets());
    let stats: Vec<OffsetStats> = curves
        .offsets()
        .iter()
        .zip(&labels)
        .enumerate()
        .map(|(i, (&offset, label))| {
            let mean = curves.column_mean(i);
            let expected_mean = simulator.expected_rate(t, offset)?;
            let variance = curves.column_variance(i);
            let expected_variance = simulator.theoretical_variance(t, offset)?;
            Ok(OffsetStats {
                offset: label.clone(),
                mean_display: format_rate(mean),
                expected_mean_display: format_rate(expected_mean),
                variance_display: format_variance(variance),
                expected_variance_display: format_variance(expected_variance),
                mean,
                expected_mean,
                variance,
                expected_variance,
            })
        })
        .collect::<CurveResult<_>>()?;

    if format == OutputFormat::Table {
        print_header(&format!(
            "Zero-rate moments over {} curves (a = {}, sigma = {}, t = {})",
            curves.num_samples(),
            config.mean_reversion,
            config.volatility,
            t
        ));
    }
    print_output(&stats, format)
}
