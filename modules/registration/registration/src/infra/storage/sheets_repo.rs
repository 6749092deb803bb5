use async_trait::async_trait;
use registration_sdk::RegistrationRecord;
use sheets_client::SheetsClient;
use tracing::{debug, instrument, warn};

use super::mapper::{self, MIN_CELLS};
use crate::domain::error::StoreError;
use crate::domain::repo::RegistrationRepository;

/// Records stored as rows of one sheet in a Google spreadsheet.
///
/// Every lookup reads the whole `A:D` range and scans it in order; there is no
/// index and no local cache.
#[derive(Debug, Clone)]
pub struct SheetsRegistrationRepository {
    client: SheetsClient,
    sheet_name: String,
    header_rows: usize,
}

impl SheetsRegistrationRepository {
    pub fn new(client: SheetsClient, sheet_name: impl Into<String>) -> Self {
        Self {
            client,
            sheet_name: sheet_name.into(),
            header_rows: 0,
        }
    }

    /// Skip this many leading rows when reading.
    #[must_use]
    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    async fn data_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let range = mapper::a1_range(&self.sheet_name, "A:D");
        let rows = self.client.get_values(&range).await?;
        Ok(rows.into_iter().skip(self.header_rows).collect())
    }

    fn sheet_row_number(&self, index: usize) -> usize {
        self.header_rows + index + 1
    }
}

#[async_trait]
impl RegistrationRepository for SheetsRegistrationRepository {
    #[instrument(skip(self, record), fields(sheet = %self.sheet_name, identifier = %record.identifier))]
    async fn append(&self, record: &RegistrationRecord) -> Result<(), StoreError> {
        let range = mapper::a1_range(&self.sheet_name, "A1");
        let summary = self
            .client
            .append_row(&range, &mapper::to_row(record))
            .await?;
        debug!(updated_range = %summary.updated_range, "registration row appended");
        Ok(())
    }

    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        let rows = self.data_rows().await?;
        let found = rows
            .iter()
            .find(|row| mapper::row_has_identifier(row, identifier))
            .and_then(|row| mapper::from_row(row));
        debug!(scanned = rows.len(), found = found.is_some(), "identifier scan finished");
        Ok(found)
    }

    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    async fn list_all(&self) -> Result<Vec<RegistrationRecord>, StoreError> {
        let rows = self.data_rows().await?;
        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if let Some(record) = mapper::from_row(row) {
                records.push(record);
            } else {
                warn!(
                    row = self.sheet_row_number(index),
                    cells = row.len(),
                    min_cells = MIN_CELLS,
                    "skipping sheet row without an identifier"
                );
            }
        }
        Ok(records)
    }
}
