use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;

/// Build a CORS layer from config. Entries that fail to parse are skipped
/// with a warning; `"*"` in any list means "any".
#[must_use]
pub fn build_cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    if cfg.allowed_origins.iter().any(|o| o == "*") {
        warn!(
            "CORS allows any origin; set cors.allowed_origins to explicit origins \
             for public deployments"
        );
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = parse_all(&cfg.allowed_origins, "origin", |s| {
            HeaderValue::from_str(s).ok()
        });
        if !origins.is_empty() {
            layer = layer.allow_origin(origins);
        }
    }

    if cfg.allowed_methods.iter().any(|m| m == "*") {
        layer = layer.allow_methods(Any);
    } else {
        let methods: Vec<Method> = parse_all(&cfg.allowed_methods, "method", |s| s.parse().ok());
        if !methods.is_empty() {
            layer = layer.allow_methods(methods);
        }
    }

    if cfg.allowed_headers.iter().any(|h| h == "*") {
        layer = layer.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = parse_all(&cfg.allowed_headers, "header", |s| s.parse().ok());
        if !headers.is_empty() {
            layer = layer.allow_headers(headers);
        }
    }

    if cfg.max_age_seconds > 0 {
        layer = layer.max_age(Duration::from_secs(cfg.max_age_seconds));
    }

    layer
}

fn parse_all<T>(values: &[String], what: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| {
            let parsed = parse(value);
            if parsed.is_none() {
                warn!(kind = what, value = %value, "ignoring unparsable CORS entry");
            }
            parsed
        })
        .collect()
}
