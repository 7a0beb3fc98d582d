use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup configuration problems; these stop the process
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set. Please set it in your environment or .env file.")]
    MissingVar(&'static str),

    #[error("invalid value '{value}' for {key}")]
    InvalidVar { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("failed to read DOCX: {0}")]
    Docx(String),

    #[error("extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Failure inside one of the turn handlers. Carried through the turn context
/// as data, so it is serializable and only holds the rendered cause.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerError {
    #[error("{0}")]
    Completion(String),

    #[error("{0}")]
    Retrieval(String),
}

impl HandlerError {
    pub fn completion(err: impl std::fmt::Display) -> Self {
        Self::Completion(err.to_string())
    }

    pub fn retrieval(err: impl std::fmt::Display) -> Self {
        Self::Retrieval(err.to_string())
    }
}

/// Errors surfaced by the session controller to its callers
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to index legal reference base: {0}")]
    Reference(String),

    #[error("failed to generate draft: {0}")]
    Draft(HandlerError),

    #[error("session storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}
