use std::sync::Arc;

use async_trait::async_trait;
use registration_sdk::{
    CredentialArtifact, CredentialHandle, NewRegistration, RegistrationClientV1,
    RegistrationError, RegistrationRecord, VerificationResult,
};

use crate::domain::attendance::AttendanceVerifier;
use crate::domain::service::RegistrationService;

/// In-process implementation of [`RegistrationClientV1`] that delegates to the
/// domain service.
pub struct RegistrationLocalClient {
    service: Arc<RegistrationService>,
    verifier: Arc<AttendanceVerifier>,
}

impl RegistrationLocalClient {
    pub fn new(service: Arc<RegistrationService>, verifier: Arc<AttendanceVerifier>) -> Self {
        Self { service, verifier }
    }
}

#[async_trait]
impl RegistrationClientV1 for RegistrationLocalClient {
    async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<CredentialHandle, RegistrationError> {
        let (_, handle) = self.service.register(registration).await?;
        Ok(handle)
    }

    async fn get_registration(
        &self,
        identifier: &str,
    ) -> Result<RegistrationRecord, RegistrationError> {
        self.service.resolve(identifier).await.map_err(Into::into)
    }

    async fn list_registrations(&self) -> Result<Vec<RegistrationRecord>, RegistrationError> {
        self.service.list_all().await.map_err(Into::into)
    }

    async fn credential(&self, identifier: &str) -> Result<CredentialArtifact, RegistrationError> {
        self.service.credential(identifier).await.map_err(Into::into)
    }

    async fn bulk_credentials(&self) -> Result<CredentialArtifact, RegistrationError> {
        self.service.bulk_credentials().await.map_err(Into::into)
    }

    async fn verify_attendance(
        &self,
        identifier: &str,
    ) -> Result<VerificationResult, RegistrationError> {
        self.verifier.verify(identifier).await.map_err(Into::into)
    }
}
