//! Train command implementation.
//!
//! Simulates a training set, fits either the plain VAE on whole curves or the
//! conditional VAE on (rate, time-to-maturity) pairs, then generates new
//! curves from the trained decoder.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use convex_config::{ExperimentConfig, Validate};
use convex_curves::{HullWhiteSimulator, SimulatedCurves};
use convex_vae::{
    Batch, ConditionalDataset, ConditionalVae, Trainable, Trainer, TrainingReport, Vae,
};

use super::{load_experiment, offset_labels};
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{format_loss, print_header, print_matrix, print_output, print_warning, KeyValue};

/// Arguments for the train command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Train the conditional model on (rate, time-to-maturity) pairs
    #[arg(long)]
    pub conditional: bool,

    /// Number of optimizer steps
    #[arg(short, long)]
    pub iterations: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Minibatch size (full batch when omitted)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// KL weight in the loss
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Latent dimension
    #[arg(long)]
    pub latent_dim: Option<usize>,

    /// Hidden layer width
    #[arg(long)]
    pub hidden_dim: Option<usize>,

    /// Number of simulated training curves
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Number of curves to generate after training
    #[arg(short, long, default_value = "10")]
    pub generate: usize,

    /// Seed for initialization, minibatching and generation
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Everything a training run produces.
#[derive(Debug, Serialize)]
struct TrainOutcome {
    model: &'static str,
    parameters: usize,
    offsets: Vec<f64>,
    report: TrainingReport,
    generated: Vec<Vec<f64>>,
}

/// Executes the train command.
pub fn execute(args: TrainArgs, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    if args.generate == 0 {
        return Err(CliError::InvalidArgument {
            name: "generate",
            reason: "must be at least 1".to_string(),
        }
        .into());
    }

    let mut config = load_experiment(config_path)?;
    apply_overrides(&mut config, &args);
    config.validate_or_error()?;

    let simulator = HullWhiteSimulator::from_config(&config.simulator)?;
    let curves = simulator.simulate_config(
        &config.simulator,
        &mut StdRng::seed_from_u64(config.simulator.seed),
    )?;

    let trainer = Trainer::new(config.training.clone())?;
    let mut rng = StdRng::seed_from_u64(config.training.seed);

    let outcome = if args.conditional {
        train_conditional(&config, &curves, &trainer, args.generate, &mut rng)?
    } else {
        train_plain(&config, &curves, &trainer, args.generate, &mut rng)?
    };

    info!(
        model = outcome.model,
        initial_loss = outcome.report.initial_loss.total,
        final_loss = outcome.report.final_loss.total,
        "training run complete"
    );
    if !outcome.report.improved() {
        print_warning(
            "final loss is not below the initial loss; \
             try more iterations or a different learning rate",
        );
    }

    report(&outcome, format)
}

fn apply_overrides(config: &mut ExperimentConfig, args: &TrainArgs) {
    if let Some(n) = args.samples {
        config.simulator.num_samples = n;
    }
    if let Some(iterations) = args.iterations {
        config.training.iterations = iterations;
    }
    if let Some(lr) = args.learning_rate {
        config.training.learning_rate = lr;
    }
    if let Some(size) = args.batch_size {
        config.training.batch_size = Some(size);
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(alpha) = args.alpha {
        config.vae.alpha = alpha;
        config.conditional_vae.alpha = alpha;
    }
    if let Some(latent) = args.latent_dim {
        config.vae.latent_dim = latent;
        config.conditional_vae.latent_dim = latent;
    }
    if let Some(hidden) = args.hidden_dim {
        config.vae.hidden_dim = hidden;
        config.conditional_vae.hidden_dim = hidden;
    }
}

fn train_plain(
    config: &ExperimentConfig,
    curves: &SimulatedCurves,
    trainer: &Trainer,
    draws: usize,
    rng: &mut StdRng,
) -> Result<TrainOutcome> {
    let mut model = Vae::new(config.vae.clone(), rng)?;
    let batch = Batch::new(curves.rates().clone());
    let report = trainer.fit(&mut model, &batch, rng)?;

    let generated = model.generate(draws, rng)?;
    Ok(TrainOutcome {
        model: "vae",
        parameters: model.parameter_count(),
        offsets: curves.offsets().to_vec(),
        report,
        generated: matrix_rows(&generated),
    })
}

fn train_conditional(
    config: &ExperimentConfig,
    curves: &SimulatedCurves,
    trainer: &Trainer,
    draws: usize,
    rng: &mut StdRng,
) -> Result<TrainOutcome> {
    let cvae_config = &config.conditional_vae;
    // The dataset pairs one rate with one time to maturity.
    if cvae_config.output_dim != 1 || cvae_config.condition_dim() != 1 {
        return Err(CliError::InvalidArgument {
            name: "conditional",
            reason: format!(
                "conditional_vae must have input_dim = 2 and output_dim = 1, found {} and {}",
                cvae_config.input_dim, cvae_config.output_dim
            ),
        }
        .into());
    }

    let dataset = ConditionalDataset::from_curves(curves)?;
    let mut model = ConditionalVae::new(cvae_config.clone(), rng)?;
    let report = trainer.fit(&mut model, &dataset.to_batch()?, rng)?;

    let offsets = curves.offsets().to_vec();
    let conditions = DMatrix::from_column_slice(offsets.len(), 1, &offsets);
    let generated = model.generate(draws, &conditions, rng)?;

    let rows = (0..generated.num_draws())
        .map(|i| {
            (0..generated.num_conditions())
                .map(|j| generated.samples()[(i, j)])
                .collect()
        })
        .collect();

    Ok(TrainOutcome {
        model: "cvae",
        parameters: model.parameter_count(),
        offsets,
        report,
        generated: rows,
    })
}

fn matrix_rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|row| row.iter().copied().collect()).collect()
}

fn report(outcome: &TrainOutcome, format: OutputFormat) -> Result<()> {
    let title = format!("Generated curves ({} draws)", outcome.generated.len());
    let labels = offset_labels(&outcome.offsets);

    match format {
        OutputFormat::Table => {
            let final_loss = &outcome.report.final_loss;
            let summary = vec![
                KeyValue::new("Model", outcome.model),
                KeyValue::new("Parameters", outcome.parameters.to_string()),
                KeyValue::new("Iterations", outcome.report.iterations.to_string()),
                KeyValue::new("Initial Loss", format_loss(outcome.report.initial_loss.total)),
                KeyValue::new("Final Loss", format_loss(final_loss.total)),
                KeyValue::new("Reconstruction", format_loss(final_loss.reconstruction)),
                KeyValue::new("KL Divergence", format_loss(final_loss.kl)),
            ];
            print_header("Training summary");
            print_output(&summary, format)?;
            print_matrix(&title, &labels, &outcome.generated, format)
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome)?);
            Ok(())
        }
        OutputFormat::Csv => print_matrix(&title, &labels, &outcome.generated, format),
        OutputFormat::Minimal => {
            println!("{}", outcome.report.final_loss.total);
            Ok(())
        }
    }
}
