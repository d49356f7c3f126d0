//! Error types for examplan

use thiserror::Error;

/// Main error type for examplan
///
/// Only conditions that stop a run outright are errors. Skipped records,
/// oversized courses, unseated students and unfilled rooms are reported
/// through [`crate::Diagnostics`] instead.
#[derive(Error, Debug)]
pub enum ExamplanError {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A setting holds a value the pipeline cannot run with
    #[error("Invalid setting `{setting}`: {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },

    /// Record bundle could not be read or parsed
    #[error("Input error: {0}")]
    Input(String),

    /// Run was aborted between two stages
    #[error("Run cancelled after stage: {completed_stage}")]
    Cancelled { completed_stage: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for examplan operations
pub type ExamplanResult<T> = Result<T, ExamplanError>;

impl From<serde_json::Error> for ExamplanError {
    fn from(err: serde_json::Error) -> Self {
        ExamplanError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ExamplanError {
    fn from(err: toml::de::Error) -> Self {
        ExamplanError::Config(err.to_string())
    }
}
