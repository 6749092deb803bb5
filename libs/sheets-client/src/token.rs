use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aliri_clock::DurationSecs;
use aliri_tokens::backoff::ErrorBackoffConfig;
use aliri_tokens::jitter::RandomEarlyJitter;
use aliri_tokens::{TokenStatus, TokenWatcher};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use tokio::sync::Mutex;

use crate::credentials::ServiceAccountKey;
use crate::error::SheetsError;
use crate::secret::SecretString;
use crate::source::{RefreshPolicy, ServiceAccountTokenSource};

/// Source of bearer tokens for Sheets API requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> Result<SecretString, SheetsError>;

    /// Drop any cached token so the next call uses a fresh one.
    ///
    /// Called after the API answers 401 for a token that looked valid.
    async fn invalidate(&self) {}
}

/// Serves one fixed token; never refreshes.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<SecretString, SheetsError> {
        Ok(self.token.clone())
    }
}

struct TokenInner {
    watcher: TokenWatcher,
}

/// Bearer tokens for a Google service account.
///
/// The first [`access_token`](TokenProvider::access_token) call spawns an
/// `aliri_tokens` [`TokenWatcher`] over a JWT-bearer token source; later calls
/// are lock-free reads of the watcher's current token, which is refreshed in
/// the background before it expires. Construction never touches the network.
pub struct ServiceAccountTokenProvider {
    http: reqwest::Client,
    key: Arc<ServiceAccountKey>,
    signing_key: Arc<EncodingKey>,
    policy: RefreshPolicy,
    jitter_max: Duration,
    inner: ArcSwapOption<TokenInner>,
    // serializes watcher (re)spawns
    spawn: Mutex<()>,
}

impl fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("client_email", &self.key.client_email)
            .field("token_uri", &self.key.token_uri.as_str())
            .field("started", &self.inner.load().is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenProvider {
    /// Build a provider for the spreadsheets scope.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Config`] if the private key is not a valid RSA
    /// PEM key or the HTTP client cannot be built.
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, SheetsError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose().as_bytes())
            .map_err(|e| SheetsError::Config(format!("invalid service account private key: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SheetsError::Config(format!("cannot build token HTTP client: {e}")))?;

        Ok(Self {
            http,
            key: Arc::new(key),
            signing_key: Arc::new(signing_key),
            policy: RefreshPolicy {
                refresh_offset: Duration::from_secs(5 * 60),
                min_refresh_period: Duration::from_secs(10),
                default_ttl: Duration::from_secs(5 * 60),
            },
            jitter_max: Duration::from_secs(60),
            inner: ArcSwapOption::empty(),
            spawn: Mutex::new(()),
        })
    }

    async fn spawn_watcher(&self) -> Result<TokenWatcher, SheetsError> {
        let source = ServiceAccountTokenSource::new(
            self.http.clone(),
            Arc::clone(&self.key),
            Arc::clone(&self.signing_key),
            self.policy,
        );
        let jitter = RandomEarlyJitter::new(DurationSecs(self.jitter_max.as_secs()));
        let backoff = ErrorBackoffConfig::new(
            self.policy.min_refresh_period,
            self.policy.min_refresh_period * 30,
            2,
        );

        TokenWatcher::spawn_from_token_source(source, jitter, backoff).await
    }
}

fn current_token(inner: &TokenInner) -> Result<SecretString, SheetsError> {
    let borrowed = inner.watcher.token();
    if matches!(borrowed.token_status(), TokenStatus::Expired) {
        return Err(SheetsError::Unavailable(
            "service account token expired, refresh pending".into(),
        ));
    }
    Ok(SecretString::new(borrowed.access_token().as_str()))
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<SecretString, SheetsError> {
        if let Some(inner) = self.inner.load_full() {
            return current_token(&inner);
        }

        let _spawning = self.spawn.lock().await;
        if let Some(inner) = self.inner.load_full() {
            return current_token(&inner);
        }
        let inner = Arc::new(TokenInner {
            watcher: self.spawn_watcher().await?,
        });
        self.inner.store(Some(Arc::clone(&inner)));
        current_token(&inner)
    }

    /// Replace the watcher with a freshly spawned one. On failure the current
    /// watcher stays in place.
    async fn invalidate(&self) {
        let _spawning = self.spawn.lock().await;
        match self.spawn_watcher().await {
            Ok(watcher) => self.inner.store(Some(Arc::new(TokenInner { watcher }))),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "service account token invalidation failed; keeping current token"
                );
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use url::Url;

    const KEY_JSON: &str = include_str!("../tests/fixtures/service_account.json");

    fn provider_for(server: &MockServer) -> ServiceAccountTokenProvider {
        let mut key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        key.token_uri = Url::parse(&server.url("/token")).unwrap();
        ServiceAccountTokenProvider::new(key, Duration::from_secs(5)).unwrap()
    }

    fn token_json(token: &str, expires_in: u64) -> String {
        format!(r#"{{"access_token":"{token}","expires_in":{expires_in},"token_type":"Bearer"}}"#)
    }

    #[test]
    fn provider_is_send_sync() {
        fn assert_traits<T: Send + Sync>() {}
        assert_traits::<ServiceAccountTokenProvider>();
    }

    #[test]
    fn invalid_private_key_is_config_error() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email":"svc@example.com","private_key":"not a pem"}"#,
        )
        .unwrap();
        let err = ServiceAccountTokenProvider::new(key, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SheetsError::Config(ref m) if m.contains("private key")));
    }

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("tok-static");
        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-static");
    }

    #[tokio::test]
    async fn construction_does_not_fetch_a_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-lazy", 3600));
        });

        let _provider = provider_for(&server);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn token_is_served_from_watcher_after_first_fetch() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-cached", 3600));
        });

        let provider = provider_for(&server);
        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-cached");
        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-cached");

        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_calls_spawn_one_watcher() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-once", 3600));
        });

        let provider = provider_for(&server);
        let (a, b) = tokio::join!(provider.access_token(), provider.access_token());

        assert_eq!(a.unwrap().expose(), "tok-once");
        assert_eq!(b.unwrap().expose(), "tok-once");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_replaces_watcher() {
        let server = MockServer::start();
        let mut first = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-old", 3600));
        });

        let provider = provider_for(&server);
        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-old");

        first.delete();
        let second = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-new", 3600));
        });
        provider.invalidate().await;

        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-new");
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn failed_invalidation_keeps_current_token() {
        let server = MockServer::start();
        let mut ok = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .body(token_json("tok-kept", 3600));
        });

        let provider = provider_for(&server);
        provider.access_token().await.unwrap();

        ok.delete();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(503).body("down");
        });
        provider.invalidate().await;

        assert_eq!(provider.access_token().await.unwrap().expose(), "tok-kept");
    }

    #[tokio::test]
    async fn refused_grant_surfaces_as_auth_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(400)
                .header("content-type", "application/json")
                .body(r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#);
        });

        let provider = provider_for(&server);
        let err = provider.access_token().await.unwrap_err();
        assert!(
            matches!(err, SheetsError::Auth(ref m) if m.contains("Invalid JWT Signature")),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn debug_does_not_reveal_key_or_token() {
        let server = MockServer::start();
        let provider = provider_for(&server);
        let dbg = format!("{provider:?}");
        assert!(!dbg.contains("PRIVATE KEY"), "{dbg}");
        assert!(dbg.contains("registrar@registrar-test.iam.gserviceaccount.com"));
    }
}
