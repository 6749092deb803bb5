//! Registration module
//!
//! Intake of registrants, ID-card rendering, and attendance check-in. The
//! public API is defined in `registration-sdk` and re-exported here.

pub use registration_sdk::{
    CredentialArtifact, CredentialHandle, Identifier, NewRegistration, PhotoUpload,
    RegistrationClientV1, RegistrationError, RegistrationRecord, VerificationResult,
};

pub mod config;
pub mod module;
pub use config::{RegistrationConfig, SheetsStoreConfig, StoreConfig};
pub use module::RegistrationModule;

pub mod local_client;
pub use local_client::RegistrationLocalClient;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
