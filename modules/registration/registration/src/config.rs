use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the `registration` module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Background image drawn on every ID card (PNG or JPEG).
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// When set, rendered cards are also written here. Never read back.
    #[serde(default)]
    pub artifact_cache_dir: Option<PathBuf>,
    /// Extra identifier draws when a fresh identifier is already taken.
    /// Zero keeps registration to a single store write.
    #[serde(default)]
    pub collision_retries: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            template_path: default_template_path(),
            upload_dir: default_upload_dir(),
            artifact_cache_dir: None,
            collision_retries: 0,
        }
    }
}

/// Where records live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process memory; lost on restart.
    #[default]
    Memory,
    /// A Google spreadsheet, one row per registrant.
    Sheets(SheetsStoreConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetsStoreConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Service-account key file downloaded from the cloud console.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: Url,
    /// Leading rows (titles, column headers) that are not records.
    #[serde(default)]
    pub header_rows: usize,
    #[serde(default = "default_sheets_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("template.png")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_sheet_name() -> String {
    "Sheet1".to_owned()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_sheets_base_url() -> Url {
    #[allow(clippy::unwrap_used)] // constant, covered by tests
    Url::parse(sheets_client::config::DEFAULT_BASE_URL).unwrap()
}

fn default_sheets_timeout_secs() -> u64 {
    30
}
