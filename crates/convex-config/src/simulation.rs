//! Curve simulator configuration types.

use serde::{Deserialize, Serialize};

use crate::error::{Validate, ValidationError};

// =============================================================================
// DETERMINISTIC ZERO CURVE
// =============================================================================

/// Deterministic zero curve `z0(T)` added on top of the stochastic component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZeroCurveConfig {
    /// A single continuously compounded rate for every maturity.
    Flat {
        /// The zero rate.
        rate: f64,
    },

    /// Pillar rates, linearly interpolated with flat extrapolation.
    Pillars {
        /// Pillar times in years (strictly increasing).
        tenors: Vec<f64>,
        /// Zero rates at each pillar.
        rates: Vec<f64>,
    },
}

impl Validate for ZeroCurveConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        match self {
            Self::Flat { rate } => {
                if !rate.is_finite() {
                    errors.push(ValidationError::new("rate", "Rate must be finite"));
                }
            }
            Self::Pillars { tenors, rates } => {
                if tenors.is_empty() {
                    errors.push(ValidationError::new("tenors", "At least one pillar is required"));
                }
                if tenors.len() != rates.len() {
                    errors.push(ValidationError::with_rule(
                        "rates",
                        format!(
                            "Expected {} rates to match tenors, got {}",
                            tenors.len(),
                            rates.len()
                        ),
                        "matching_lengths",
                    ));
                }
                if tenors.windows(2).any(|w| w[1] <= w[0]) {
                    errors.push(ValidationError::with_rule(
                        "tenors",
                        "Tenors must be strictly increasing",
                        "monotonic_tenors",
                    ));
                }
                if tenors.iter().chain(rates).any(|v| !v.is_finite()) {
                    errors.push(ValidationError::new("rates", "Pillars must be finite"));
                }
            }
        }

        errors
    }
}

// =============================================================================
// SIMULATOR CONFIGURATION
// =============================================================================

/// Configuration for the mean-reverting curve simulator.
///
/// The first three fields parameterize the model itself; the remaining fields
/// describe the default simulation request (curve grid and sample count).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Mean reversion speed `a` (must be positive).
    pub mean_reversion: f64,

    /// Short-rate volatility `sigma` (must be non-negative).
    pub volatility: f64,

    /// Optional deterministic zero curve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_curve: Option<ZeroCurveConfig>,

    /// Observation time `t` in years.
    #[serde(default = "default_observation_time")]
    pub observation_time: f64,

    /// Maturity offsets `Delta` in years (each strictly positive).
    #[serde(default = "default_offsets")]
    pub offsets: Vec<f64>,

    /// Number of simulated curves.
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    /// Seed for the simulation random source.
    #[serde(default = "default_simulation_seed")]
    pub seed: u64,
}

fn default_observation_time() -> f64 {
    10.0
}

/// Standard maturity offsets: one day out to twenty years.
pub fn default_offsets() -> Vec<f64> {
    vec![
        1.0 / 365.0,
        0.5,
        1.0,
        2.0,
        3.0,
        5.0,
        7.0,
        10.0,
        15.0,
        20.0,
    ]
}

fn default_num_samples() -> usize {
    1024
}

fn default_simulation_seed() -> u64 {
    42
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(0.15, 0.0075)
    }
}

impl SimulatorConfig {
    /// Creates a configuration with the given model parameters and default grid.
    pub fn new(mean_reversion: f64, volatility: f64) -> Self {
        Self {
            mean_reversion,
            volatility,
            zero_curve: None,
            observation_time: default_observation_time(),
            offsets: default_offsets(),
            num_samples: default_num_samples(),
            seed: default_simulation_seed(),
        }
    }

    /// Sets the deterministic zero curve.
    #[must_use]
    pub fn with_zero_curve(mut self, curve: ZeroCurveConfig) -> Self {
        self.zero_curve = Some(curve);
        self
    }

    /// Sets the observation time.
    #[must_use]
    pub fn with_observation_time(mut self, t: f64) -> Self {
        self.observation_time = t;
        self
    }

    /// Sets the maturity offsets.
    #[must_use]
    pub fn with_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.offsets = offsets;
        self
    }

    /// Sets the number of samples.
    #[must_use]
    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates only the model parameters, ignoring the simulation request.
    pub fn validate_model(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.mean_reversion.is_finite() && self.mean_reversion > 0.0) {
            errors.push(ValidationError::with_rule(
                "mean_reversion",
                format!("Mean reversion must be positive, got {}", self.mean_reversion),
                "positive_mean_reversion",
            ));
        }

        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            errors.push(ValidationError::with_rule(
                "volatility",
                format!("Volatility must be non-negative, got {}", self.volatility),
                "non_negative_volatility",
            ));
        }

        if let Some(curve) = &self.zero_curve {
            errors.extend(curve.validate().into_iter().map(|e| e.nested("zero_curve")));
        }

        errors
    }
}

impl Validate for SimulatorConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.validate_model();

        if !(self.observation_time.is_finite() && self.observation_time >= 0.0) {
            errors.push(ValidationError::new(
                "observation_time",
                "Observation time must be non-negative",
            ));
        }

        if self.offsets.is_empty() {
            errors.push(ValidationError::new("offsets", "At least one offset is required"));
        }

        if let Some(index) = self.offsets.iter().position(|d| !(d.is_finite() && *d > 0.0)) {
            errors.push(ValidationError::with_rule(
                "offsets",
                format!(
                    "Offset at index {index} must be strictly positive, got {}",
                    self.offsets[index]
                ),
                "positive_offsets",
            ));
        }

        if self.num_samples == 0 {
            errors.push(ValidationError::new("num_samples", "Sample count must be positive"));
        }

        errors
    }
}
