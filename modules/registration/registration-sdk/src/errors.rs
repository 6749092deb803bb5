//! Public error types for the `registration` module.
//!
//! Safe to hand to other modules; dependency failures are collapsed into
//! [`RegistrationError::Internal`] without their details.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Input was incomplete or malformed.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// No record carries the requested identifier.
    #[error("Registration not found: {identifier}")]
    NotFound { identifier: String },

    /// Storage, rendering, or upload failed.
    #[error("Internal error")]
    Internal,
}

impl RegistrationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
