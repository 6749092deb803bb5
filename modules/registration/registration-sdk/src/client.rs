use async_trait::async_trait;

use crate::errors::RegistrationError;
use crate::models::{
    CredentialArtifact, CredentialHandle, NewRegistration, RegistrationRecord, VerificationResult,
};

/// Public API of the registration module for in-process consumers.
///
/// For the local implementation see `registration::RegistrationLocalClient`.
#[async_trait]
pub trait RegistrationClientV1: Send + Sync {
    /// Validate and store a registrant, returning the issued identifier.
    async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<CredentialHandle, RegistrationError>;

    /// Look up one record by identifier.
    async fn get_registration(
        &self,
        identifier: &str,
    ) -> Result<RegistrationRecord, RegistrationError>;

    /// All records in store order.
    async fn list_registrations(&self) -> Result<Vec<RegistrationRecord>, RegistrationError>;

    /// Render the ID card for one registrant.
    async fn credential(&self, identifier: &str) -> Result<CredentialArtifact, RegistrationError>;

    /// Render one document with an ID card page per registrant.
    async fn bulk_credentials(&self) -> Result<CredentialArtifact, RegistrationError>;

    /// Check an identifier presented at the door.
    ///
    /// Unknown identifiers are not an error here: they yield
    /// `present == false`.
    async fn verify_attendance(
        &self,
        identifier: &str,
    ) -> Result<VerificationResult, RegistrationError>;
}
