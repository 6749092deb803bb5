use async_trait::async_trait;
use registration_sdk::RegistrationRecord;

use super::error::StoreError;

/// Append-only store of registration records.
///
/// Implementations hold no authoritative cache: every read goes to the
/// backing store.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Write one record after all existing ones.
    async fn append(&self, record: &RegistrationRecord) -> Result<(), StoreError>;

    /// First record whose identifier equals `identifier` exactly.
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<RegistrationRecord>, StoreError>;

    /// Every record in store order.
    async fn list_all(&self) -> Result<Vec<RegistrationRecord>, StoreError>;
}
