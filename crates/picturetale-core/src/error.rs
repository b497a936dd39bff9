//! Error types for the picturetale pipeline.
//!
//! Pipeline errors follow the three-way taxonomy surfaced to the user:
//! bad input, an unreachable model, or a narration-specific failure.

use crate::types::Stage;
use thiserror::Error;

/// Top-level error type for picturetale operations.
#[derive(Error, Debug)]
pub enum PicturetaleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline stage errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised by a pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The upload or the stage input is missing, empty, or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The external model provider could not be reached or gave no usable answer.
    #[error("{stage} model unavailable: {message}")]
    ModelUnavailable {
        stage: Stage,
        message: String,
        status_code: Option<u16>,
    },

    /// Speech synthesis failed after the provider answered.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
}

impl PipelineError {
    /// Shorthand for a `ModelUnavailable` without an HTTP status.
    pub fn unavailable(stage: Stage, message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            stage,
            message: message.into(),
            status_code: None,
        }
    }

    /// Stable machine-readable kind, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::Synthesis(_) => "synthesis_error",
        }
    }

    /// HTTP status reported by the provider, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ModelUnavailable { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Convenience type alias for picturetale results.
pub type Result<T> = std::result::Result<T, PicturetaleError>;

/// Convenience type alias for pipeline-stage results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(
            PipelineError::InvalidInput("empty".into()).kind(),
            "invalid_input"
        );
        assert_eq!(
            PipelineError::unavailable(Stage::Story, "down").kind(),
            "model_unavailable"
        );
        assert_eq!(
            PipelineError::Synthesis("bad".into()).kind(),
            "synthesis_error"
        );
    }

    #[test]
    fn test_unavailable_display_names_stage() {
        let err = PipelineError::ModelUnavailable {
            stage: Stage::Caption,
            message: "HTTP 503".into(),
            status_code: Some(503),
        };
        assert_eq!(err.to_string(), "caption model unavailable: HTTP 503");
        assert_eq!(err.status_code(), Some(503));
    }
}
