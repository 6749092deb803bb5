use std::time::Duration;

use url::Url;

use crate::error::SheetsError;

/// Public endpoint of the Google Sheets API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

/// Connection settings for [`SheetsClient`](crate::SheetsClient).
#[derive(Debug, Clone)]
pub struct SheetsClientConfig {
    /// API root; overridden in tests and when pointing at an emulator.
    pub base_url: Url,
    /// Identifier of the spreadsheet every request is addressed to.
    pub spreadsheet_id: String,
    /// Per-request timeout (connect + response).
    pub timeout: Duration,
}

impl SheetsClientConfig {
    /// Config for the public API with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if `spreadsheet_id` is blank.
    pub fn new(spreadsheet_id: impl Into<String>) -> Result<Self, SheetsError> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| SheetsError::Config(format!("invalid default base url: {e}")))?;
        let cfg = Self {
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            timeout: Duration::from_secs(30),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if the spreadsheet id is blank, the
    /// timeout is zero, or the base URL cannot carry path segments.
    pub fn validate(&self) -> Result<(), SheetsError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Config(
                "spreadsheet_id must not be empty".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SheetsError::Config("timeout must be positive".into()));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(SheetsError::Config(format!(
                "base_url '{}' cannot be used as an API root",
                self.base_url
            )));
        }
        Ok(())
    }
}
