//! Error types for pdfchat

use thiserror::Error;

/// Result type alias using PdfChatError
pub type Result<T> = std::result::Result<T, PdfChatError>;

/// Error type alias for convenience
pub type Error = PdfChatError;

/// Main error type for pdfchat
#[derive(Debug, Error)]
pub enum PdfChatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PdfChatError {
    /// Whether this error came from an external collaborator call.
    ///
    /// Collaborator failures in the answer path are degraded to the
    /// canonical refusal instead of surfacing to the caller.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Llm(_) | Self::VectorStore(_) | Self::ExternalError(_)
        )
    }
}
