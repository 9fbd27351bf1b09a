//! Error types for MotherSync

use thiserror::Error;

/// Result type alias for MotherSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in MotherSync
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid credentials
    #[error("auth error: {0}")]
    Auth(String),

    /// Generative content service error
    #[error("generation error: {0}")]
    Generation(String),

    /// Translation service error
    #[error("translation error: {0}")]
    Translation(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Image upload could not be decoded or is of an unsupported type
    #[error("image error: {0}")]
    Image(String),

    /// Unknown language name or code
    #[error("unsupported language: {0}")]
    InvalidLanguage(String),

    /// Chat input was empty
    #[error("message cannot be empty")]
    EmptyMessage,

    /// Upstream service temporarily unavailable (rate limit, 5xx)
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// External call did not finish in time
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Name of the operation that timed out
        operation: &'static str,
        /// Per-attempt timeout in seconds
        seconds: u64,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether retrying the same call could succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
