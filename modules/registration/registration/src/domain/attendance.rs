use std::sync::Arc;

use registration_sdk::VerificationResult;
use tracing::{info, instrument};

use super::error::DomainError;
use super::service::RegistrationService;

/// Answers "is this identifier registered?" at the door.
///
/// Stateless: repeated checks of the same identifier give the same answer and
/// nothing is recorded.
pub struct AttendanceVerifier {
    service: Arc<RegistrationService>,
}

impl AttendanceVerifier {
    pub fn new(service: Arc<RegistrationService>) -> Self {
        Self { service }
    }

    /// # Errors
    ///
    /// Store failures only; an unknown identifier is `present == false`.
    #[instrument(skip(self))]
    pub async fn verify(&self, identifier: &str) -> Result<VerificationResult, DomainError> {
        match self.service.resolve(identifier).await {
            Ok(record) => {
                info!(identifier = %record.identifier, "attendance verified");
                Ok(VerificationResult::present(record.name))
            }
            Err(DomainError::NotFound { .. }) => Ok(VerificationResult::absent()),
            Err(e) => Err(e),
        }
    }
}
