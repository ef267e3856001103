//! Error types for DiScEPT.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Not well-formed XML, or the root is not a namespaced `TEI` element.
    #[error("Invalid TEI format: {0}")]
    InvalidFormat(String),

    /// Valid TEI, but a plain single-document `text` structure.
    #[error("Not a DiScEPT alignment model")]
    NotAlignmentModel,

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored language body that cannot be embedded in the merged document.
    #[error("Invalid document for language '{language}': {reason}")]
    InvalidDocument { language: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable short code, suitable for clients that branch on the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid",
            Self::NotAlignmentModel => "no-discept",
            Self::NotFound(_) => "not-found",
            Self::InvalidDocument { .. } => "invalid-document",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
