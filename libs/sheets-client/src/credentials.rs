use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::SheetsError;
use crate::secret::SecretString;

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> Url {
    #[allow(clippy::unwrap_used)] // constant, covered by tests
    Url::parse(GOOGLE_TOKEN_URI).unwrap()
}

/// The subset of a Google service-account key file (`credentials.json`)
/// needed for the JWT-bearer grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: Url,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if the JSON is malformed or required
    /// fields are missing or blank.
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| SheetsError::Config(format!("invalid service account key: {e}")))?;
        if key.client_email.trim().is_empty() {
            return Err(SheetsError::Config(
                "service account key has an empty client_email".into(),
            ));
        }
        if key.private_key.expose().trim().is_empty() {
            return Err(SheetsError::Config(
                "service account key has an empty private_key".into(),
            ));
        }
        Ok(key)
    }

    /// Read and parse a key file.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Config(format!(
                "cannot read service account key '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}
