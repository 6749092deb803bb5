use std::path::PathBuf;

use registration_sdk::RegistrationError;
use thiserror::Error;

/// Failures reported by a record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached, timed out, or refused our credential.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request as malformed.
    #[error("record store rejected request: {0}")]
    Rejected(String),
}

/// Failures while producing an ID-card document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("card template not found at '{}'", .path.display())]
    MissingTemplate { path: PathBuf },

    #[error("card template '{}' cannot be decoded: {reason}", .path.display())]
    InvalidTemplate { path: PathBuf, reason: String },

    #[error("cannot encode QR payload for {identifier}: {reason}")]
    EncodingFailed { identifier: String, reason: String },

    #[error("cannot finalize PDF: {0}")]
    Finalize(String),
}

/// A photo upload could not be persisted.
#[derive(Error, Debug)]
#[error("cannot store photo '{file_name}': {source}")]
pub struct PhotoStoreError {
    pub file_name: String,
    #[source]
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("no registration with identifier {identifier}")]
    NotFound { identifier: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Upload(#[from] PhotoStoreError),

    #[error("no free identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: u32 },
}

impl DomainError {
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }
}

impl From<DomainError> for RegistrationError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MissingField { field } => {
                Self::validation(format!("missing required field: {field}"))
            }
            DomainError::NotFound { identifier } => Self::not_found(identifier),
            DomainError::Store(_)
            | DomainError::Render(_)
            | DomainError::Upload(_)
            | DomainError::IdentifierExhausted { .. } => Self::internal(),
        }
    }
}
