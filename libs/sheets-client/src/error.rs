use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the Sheets client.
///
/// Messages never contain private keys or access tokens.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SheetsError {
    /// Client or credential configuration is invalid.
    #[error("sheets config error: {0}")]
    Config(String),

    /// Token acquisition failed or the API refused the credential (401/403).
    #[error("sheets authorization failed: {0}")]
    Auth(String),

    /// The API could not be reached or answered with a transient failure.
    #[error("sheets API unavailable: {0}")]
    Unavailable(String),

    /// The API rejected the request as malformed (400).
    #[error("sheets API rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The API answered 2xx but the body could not be understood.
    #[error("invalid sheets API response: {0}")]
    InvalidResponse(String),
}

impl SheetsError {
    /// Classify a non-success HTTP response from the Sheets API.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = google_error_message(body);
        match status {
            StatusCode::BAD_REQUEST => Self::Rejected { status, message },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::Auth(format!("HTTP {status}: {message}"))
            }
            _ => Self::Unavailable(format!("HTTP {status}: {message}")),
        }
    }

    /// Map a transport-level failure (connect, timeout, body read).
    pub(crate) fn transport(err: &reqwest::Error, what: &str) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        // reqwest's Display includes the URL, which carries no secrets here
        Self::Unavailable(format!("{what} {kind}: {err}"))
    }
}

/// Extract `error.message` from a Google API error body, falling back to a
/// truncated copy of the raw body.
fn google_error_message(body: &str) -> String {
    const MAX_RAW: usize = 200;

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or_else(|| e.get("error_description")))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
                .or_else(|| {
                    v.get("error_description")
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_owned)
                })
        })
        .unwrap_or_else(|| body.chars().take(MAX_RAW).collect())
}
