//! CLI command implementations.

pub mod config;
pub mod simulate;
pub mod train;

// Re-export submodules for convenience
pub use config::ConfigArgs;
pub use simulate::SimulateArgs;
pub use train::TrainArgs;

use std::path::Path;

use anyhow::Context;
use convex_config::ExperimentConfig;

use crate::error::{CliError, CliResult};

/// Loads the experiment from `path`, or the built-in worked example.
pub fn load_experiment(path: Option<&Path>) -> anyhow::Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::from_path(path)
            .with_context(|| format!("failed to load experiment from {}", path.display())),
        None => Ok(ExperimentConfig::worked_example()),
    }
}

/// Parses a comma-separated list of strictly positive maturity offsets.
pub fn parse_offsets(s: &str) -> CliResult<Vec<f64>> {
    let invalid = |reason: String| CliError::InvalidList {
        input: s.to_string(),
        reason,
    };

    let offsets = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| invalid(format!("'{part}' is not a number")))
        })
        .collect::<CliResult<Vec<f64>>>()?;

    if offsets.is_empty() {
        return Err(invalid("no offsets given".to_string()));
    }
    if let Some(bad) = offsets.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
        return Err(invalid(format!("offset {bad} must be positive")));
    }
    Ok(offsets)
}

/// Column labels for a maturity grid, e.g. `1Y`, `0.5Y`, `0.0027Y`.
pub fn offset_labels(offsets: &[f64]) -> Vec<String> {
    offsets
        .iter()
        .map(|d| {
            let fixed = format!("{d:.4}");
            format!("{}Y", fixed.trim_end_matches('0').trim_end_matches('.'))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offsets() {
        assert_eq!(parse_offsets("1, 2,5").unwrap(), vec![1.0, 2.0, 5.0]);
        assert_eq!(parse_offsets("0.25,").unwrap(), vec![0.25]);
    }

    #[test]
    fn test_parse_offsets_rejects_bad_input() {
        assert!(parse_offsets("").is_err());
        assert!(parse_offsets("1,x").is_err());
        assert!(parse_offsets("1,0").is_err());
        assert!(parse_offsets("-2").is_err());
    }

    #[test]
    fn test_offset_labels() {
        assert_eq!(
            offset_labels(&[1.0, 0.5, 1.0 / 365.0, 20.0]),
            vec!["1Y", "0.5Y", "0.0027Y", "20Y"]
        );
    }
}
