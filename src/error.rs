//! Error types for the decision analysis pipeline

use crate::schema::Stage;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// The generation service returned a non-success status
    #[error("Upstream model error: {0}")]
    Upstream(String),

    /// Model output could not be coerced into valid JSON after one retry
    #[error("Generation error: {0}")]
    Generation(String),

    /// Valid JSON that does not satisfy the stage's required-field contract
    #[error("{stage} step failed validation: {detail}")]
    SchemaValidation { stage: Stage, detail: String },

    /// Caller-supplied input is unusable (e.g. prior log is not JSON)
    #[error("Input error: {0}")]
    Input(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
