//! Error types for the intent responder.

use std::time::Duration;

/// Top-level error type for the responder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// NLU classification errors.
///
/// Every variant means "no usable intent" for the message being handled.
/// None of them is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("Refusing to classify empty text")]
    EmptyQuery,

    #[error("Request to {provider} failed: {reason}")]
    Request { provider: String, reason: String },

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("Top intent '{label}' has no score in the response")]
    MissingScore { label: String },
}

/// Result type alias for the responder.
pub type Result<T> = std::result::Result<T, Error>;
