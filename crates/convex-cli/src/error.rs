//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A list argument could not be parsed.
    #[error("Invalid list '{input}': {reason}")]
    InvalidList {
        /// The raw argument.
        input: String,
        /// What went wrong.
        reason: String,
    },

    /// An argument is outside its admissible range.
    #[error("Invalid argument --{name}: {reason}")]
    InvalidArgument {
        /// Flag name without dashes.
        name: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// Refusing to overwrite an existing file.
    #[error("{0} already exists; pass --force to overwrite")]
    FileExists(String),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
