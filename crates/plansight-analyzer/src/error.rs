//! Error types for the analyzer

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while normalizing plans or running an analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The caller handed over a value of the wrong type
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Engine identifier outside the supported set
    #[error("Unsupported engine: {0}")]
    UnsupportedEngine(String),

    /// A plan node did not match the engine's expected schema
    #[error("Malformed plan shape: {0}")]
    MalformedPlanShape(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to load config from {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
