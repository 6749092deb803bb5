use std::fmt;
use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::config::SheetsClientConfig;
use crate::error::SheetsError;
use crate::token::TokenProvider;

/// What the API reports after a successful `values:append`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendSummary {
    /// A1 range the row landed in, e.g. `Sheet1!A7:D7`.
    pub updated_range: String,
    pub updated_rows: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: String,
    #[serde(default)]
    updated_rows: u32,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Client for one spreadsheet's `values` collection.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    config: SheetsClientConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("spreadsheet_id", &self.config.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

impl SheetsClient {
    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if the config is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        config: SheetsClientConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, SheetsError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SheetsError::Config(format!("cannot build sheets HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Append one row after the last non-empty row of `range`.
    ///
    /// Values are stored as entered (`RAW`) and new rows are inserted rather
    /// than overwriting cells below the table.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] on transport failure, non-success status, or an
    /// unreadable response body.
    #[tracing::instrument(skip(self, row), fields(spreadsheet_id = %self.config.spreadsheet_id, cells = row.len()))]
    pub async fn append_row(
        &self,
        range: &str,
        row: &[String],
    ) -> Result<AppendSummary, SheetsError> {
        let mut url = self.values_url(&format!("{range}:append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [row],
        });

        let text = self
            .send_authorized("append", |http| http.post(url.clone()).json(&body))
            .await?;
        let parsed: AppendResponse = serde_json::from_str(&text)
            .map_err(|e| SheetsError::InvalidResponse(format!("append response: {e}")))?;
        let summary = parsed.updates.map_or_else(
            || AppendSummary {
                updated_range: String::new(),
                updated_rows: 0,
            },
            |u| AppendSummary {
                updated_range: u.updated_range,
                updated_rows: u.updated_rows,
            },
        );
        tracing::debug!(updated_range = %summary.updated_range, "row appended");
        Ok(summary)
    }

    /// Read every row of `range` as strings.
    ///
    /// Trailing empty cells are omitted by the API, so rows may be shorter
    /// than the range is wide. Non-string cells are rendered with their JSON
    /// text and `null` becomes an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError`] on transport failure, non-success status, or an
    /// unreadable response body.
    #[tracing::instrument(skip(self), fields(spreadsheet_id = %self.config.spreadsheet_id))]
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(range)?;
        let text = self
            .send_authorized("read", |http| http.get(url.clone()))
            .await?;
        let parsed: ValueRange = serde_json::from_str(&text)
            .map_err(|e| SheetsError::InvalidResponse(format!("values response: {e}")))?;

        let rows: Vec<Vec<String>> = parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect();
        tracing::debug!(rows = rows.len(), "values read");
        Ok(rows)
    }

    fn values_url(&self, last_segment: &str) -> Result<Url, SheetsError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SheetsError::Config(format!(
                    "base_url '{}' cannot be used as an API root",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                last_segment,
            ]);
        Ok(url)
    }

    /// Send with a bearer token; on 401 drop the cached token and retry once.
    async fn send_authorized<F>(&self, what: &str, build: F) -> Result<String, SheetsError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let mut retried = false;
        loop {
            let token = self.tokens.access_token().await?;
            let response = build(&self.http)
                .bearer_auth(token.expose())
                .send()
                .await
                .map_err(|e| SheetsError::transport(&e, what))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| SheetsError::transport(&e, what))?;

            if status.is_success() {
                return Ok(body);
            }
            if status == StatusCode::UNAUTHORIZED && !retried {
                tracing::warn!(operation = what, "sheets API returned 401, refreshing token");
                self.tokens.invalidate().await;
                retried = true;
                continue;
            }
            return Err(SheetsError::from_status(status, &body));
        }
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::token::StaticTokenProvider;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::secret::SecretString;

    fn client_for(server: &MockServer) -> SheetsClient {
        let cfg = SheetsClientConfig::new("sheet-1")
            .unwrap()
            .with_base_url(Url::parse(&server.base_url()).unwrap());
        SheetsClient::new(cfg, Arc::new(StaticTokenProvider::new("tok-test"))).unwrap()
    }

    #[test]
    fn cells_are_stringified() {
        assert_eq!(cell_to_string(json!("Ada")), "Ada");
        assert_eq!(cell_to_string(json!(123_456)), "123456");
        assert_eq!(cell_to_string(Value::Null), "");
        assert_eq!(cell_to_string(json!(true)), "true");
    }

    #[tokio::test]
    async fn append_row_posts_raw_insert_rows() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/sheet-1/values/Sheet1!A1:append")
                .query_param("valueInputOption", "RAW")
                .query_param("insertDataOption", "INSERT_ROWS")
                .header("authorization", "Bearer tok-test")
                .json_body(json!({
                    "range": "Sheet1!A1",
                    "majorDimension": "ROWS",
                    "values": [["Ada", "Speaker", "123456", "uploads/1-ada.png"]]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "spreadsheetId": "sheet-1",
                    "updates": {"updatedRange": "Sheet1!A2:D2", "updatedRows": 1, "updatedCells": 4}
                }));
        });

        let summary = client_for(&server)
            .append_row(
                "Sheet1!A1",
                &[
                    "Ada".to_owned(),
                    "Speaker".to_owned(),
                    "123456".to_owned(),
                    "uploads/1-ada.png".to_owned(),
                ],
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(summary.updated_range, "Sheet1!A2:D2");
        assert_eq!(summary.updated_rows, 1);
    }

    #[tokio::test]
    async fn get_values_handles_ragged_and_missing_rows() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-1/values/Sheet1!A:D");
            then.status(200).json_body(json!({
                "range": "Sheet1!A1:D2",
                "majorDimension": "ROWS",
                "values": [["Ada", "Speaker", "123456", "p.png"], ["Bob", "Guest", 654_321]]
            }));
        });

        let rows = client_for(&server).get_values("Sheet1!A:D").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Bob", "Guest", "654321"]);
    }

    #[tokio::test]
    async fn empty_sheet_has_no_values_key() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-1/values/Sheet1!A:D");
            then.status(200)
                .json_body(json!({"range": "Sheet1!A1:D1000", "majorDimension": "ROWS"}));
        });

        let rows = client_for(&server).get_values("Sheet1!A:D").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn bad_range_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-1/values/Nope!A:D");
            then.status(400).json_body(json!({
                "error": {"code": 400, "message": "Unable to parse range: Nope!A:D", "status": "INVALID_ARGUMENT"}
            }));
        });

        let err = client_for(&server).get_values("Nope!A:D").await.unwrap_err();
        assert!(
            matches!(err, SheetsError::Rejected { ref message, .. } if message.contains("Unable to parse range")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(503).body("backend unavailable");
        });

        let err = client_for(&server).get_values("Sheet1!A:D").await.unwrap_err();
        assert!(matches!(err, SheetsError::Unavailable(_)), "{err}");
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        let cfg = SheetsClientConfig::new("sheet-1")
            .unwrap()
            .with_base_url(Url::parse("http://127.0.0.1:9/").unwrap())
            .with_timeout(std::time::Duration::from_secs(2));
        let client =
            SheetsClient::new(cfg, Arc::new(StaticTokenProvider::new("tok"))).unwrap();

        let err = client.get_values("Sheet1!A:D").await.unwrap_err();
        assert!(matches!(err, SheetsError::Unavailable(_)), "{err}");
    }

    struct CountingProvider {
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn access_token(&self) -> Result<SecretString, SheetsError> {
            Ok(SecretString::new("tok-stale"))
        }

        async fn invalidate(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn unauthorized_invalidates_and_retries_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(401).json_body(json!({
                "error": {"code": 401, "message": "Request had invalid authentication credentials."}
            }));
        });

        let provider = Arc::new(CountingProvider {
            invalidations: AtomicUsize::new(0),
        });
        let cfg = SheetsClientConfig::new("sheet-1")
            .unwrap()
            .with_base_url(Url::parse(&server.base_url()).unwrap());
        let client = SheetsClient::new(cfg, provider.clone()).unwrap();

        let err = client.get_values("Sheet1!A:D").await.unwrap_err();
        assert!(matches!(err, SheetsError::Auth(_)), "{err}");
        assert_eq!(mock.calls(), 2);
        assert_eq!(provider.invalidations.load(Ordering::SeqCst), 1);
    }
}
