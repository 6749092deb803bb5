//! Google Sheets values API client.
//!
//! Covers exactly what a row-per-record datastore needs:
//! - [`SheetsClient::append_row`] (`values:append`, `RAW` / `INSERT_ROWS`)
//! - [`SheetsClient::get_values`] (`values.get` for a range)
//!
//! Requests are authorized with a bearer token from a [`TokenProvider`].
//! [`ServiceAccountTokenProvider`] implements the `OAuth2` JWT-bearer grant for
//! Google service accounts, with background refresh driven by `aliri_tokens`;
//! [`StaticTokenProvider`] serves a fixed token (tests, emulators).

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod secret;
mod source;
pub mod token;

pub use client::{AppendSummary, SheetsClient};
pub use config::SheetsClientConfig;
pub use credentials::ServiceAccountKey;
pub use error::SheetsError;
pub use secret::SecretString;
pub use token::{ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};

/// `OAuth2` scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
