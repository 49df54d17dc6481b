//! Text-generation collaborator contract.
//!
//! The orchestrator never talks to a model provider directly; it consumes
//! anything implementing [`TextGenerator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,
    /// Requested response format
    pub response_format: ResponseFormat,
}

impl GenerationOptions {
    /// Options requesting a JSON response.
    pub fn json() -> Self {
        Self {
            temperature: None,
            response_format: ResponseFormat::Json,
        }
    }

    /// Options requesting a plain-text response.
    pub fn text() -> Self {
        Self::default()
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Failure reported by a text-generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport-level failure
    #[error("request failed: {0}")]
    Request(String),

    /// Provider rejected the call because of rate limits
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Provider answered with an error status
    #[error("provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    /// Provider answered but the body carried no text
    #[error("empty response")]
    EmptyResponse,
}

/// Generates text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, GenerationError>;
}
