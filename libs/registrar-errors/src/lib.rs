//! Error payloads for the registrar HTTP API.
//!
//! Pure data types with no hard dependency on an HTTP framework:
//! - RFC 9457 Problem Details (`Problem`)
//! - Field-level violations attached to 4xx problems (`Violation`)
//!
//! Enable the `axum` feature to return a `Problem` directly from handlers.

pub mod problem;

pub use problem::{APPLICATION_PROBLEM_JSON, Problem, Violation};

use http::StatusCode;

pub fn bad_request(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::BAD_REQUEST, "Bad Request", detail)
}

pub fn not_found(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::NOT_FOUND, "Not Found", detail)
}

pub fn internal_error(detail: impl Into<String>) -> Problem {
    Problem::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
}
