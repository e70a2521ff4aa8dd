//! Error types for the mockup generation pipeline.

use thiserror::Error;

/// Failures surfaced by the generation client and the batch queue.
///
/// Only `RateLimited` is transient; every other kind propagates immediately.
/// `NoImageReturned` is a content-level outcome (the model declined or
/// produced no usable image), deliberately distinct from `Transport`.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Generation completed but returned no image data: {0}")]
    NoImageReturned(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GenerationError {
    /// Whether the retry wrapper may re-issue the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::RateLimited(_))
    }

    /// Short kind tag used in logs and job error details.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::RateLimited(_) => "rate_limited",
            GenerationError::NoImageReturned(_) => "no_image_returned",
            GenerationError::Transport(_) => "transport",
            GenerationError::Configuration(_) => "configuration",
        }
    }

    /// Human-readable message attached to a failed job.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::RateLimited(_) => {
                "The provider is rate limiting requests. Retry this scene in a moment.".to_string()
            }
            GenerationError::NoImageReturned(_) => {
                "The AI generation completed but returned no image data.".to_string()
            }
            GenerationError::Transport(detail) => format!("Failed to generate mockup: {detail}"),
            GenerationError::Configuration(detail) => {
                format!("Service configuration error: {detail}")
            }
        }
    }
}

impl From<config::ConfigError> for GenerationError {
    fn from(err: config::ConfigError) -> Self {
        GenerationError::Configuration(err.to_string())
    }
}
