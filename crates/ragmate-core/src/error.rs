//! Error types for RagMate.
//!
//! Every variant is recoverable inside the orchestrator: planning, execution
//! and synthesis each have a degraded output, so none of these escape
//! [`crate::RagService::query`].

use crate::generation::GenerationError;
use thiserror::Error;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// RagMate error types.
#[derive(Debug, Error)]
pub enum Error {
    /// The text-generation collaborator failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// A model payload was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Planning produced no usable plan
    #[error("Planning error: {0}")]
    Planning(String),

    /// A sub-query could not be executed
    #[error("Execution error: {0}")]
    Execution(String),

    /// Synthesis could not produce model output
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// A model payload or caller option failed validation
    #[error("Validation error: {0}")]
    Validation(String),
}
