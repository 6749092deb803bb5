use async_trait::async_trait;
use registration_sdk::RegistrationRecord;
use tokio::sync::RwLock;

use crate::domain::error::StoreError;
use crate::domain::repo::RegistrationRepository;

/// Process-local store for development and tests. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryRegistrationRepository {
    records: RwLock<Vec<RegistrationRecord>>,
}

impl InMemoryRegistrationRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrationRepository {
    async fn append(&self, record: &RegistrationRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.identifier.as_str() == identifier)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<RegistrationRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }
}
