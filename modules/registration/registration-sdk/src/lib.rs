//! Registration SDK
//!
//! Public surface of the `registration` module:
//! - `RegistrationClientV1` trait
//! - Model types for records, credentials and attendance results
//! - Error type (`RegistrationError`)
//!
//! ## Usage
//!
//! ```ignore
//! use registration_sdk::{NewRegistration, PhotoUpload, RegistrationClientV1};
//!
//! let handle = client
//!     .register(NewRegistration {
//!         name: "Ada".into(),
//!         role: "Speaker".into(),
//!         photo: Some(PhotoUpload::new("ada.png", "image/png", bytes)),
//!     })
//!     .await?;
//! let pdf = client.credential(handle.identifier.as_str()).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod client;
pub mod errors;
pub mod models;

pub use client::RegistrationClientV1;
pub use errors::RegistrationError;
pub use models::{
    CredentialArtifact, CredentialHandle, Identifier, NewRegistration, PhotoUpload,
    RegistrationRecord, VerificationResult, PDF_CONTENT_TYPE,
};
