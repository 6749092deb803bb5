use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aliri_clock::DurationSecs;
use aliri_tokens::sources::AsyncTokenSource;
use aliri_tokens::{AccessToken, IdToken, TokenLifetimeConfig, TokenWithLifetime};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::SPREADSHEETS_SCOPE;
use crate::credentials::ServiceAccountKey;
use crate::error::SheetsError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Refresh policy applied to every token the source hands out.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    pub refresh_offset: Duration,
    pub min_refresh_period: Duration,
    pub default_ttl: Duration,
}

/// `OAuth2` JWT-bearer exchange for a Google service account.
///
/// Each request signs a fresh RS256 assertion with the account's private key
/// and trades it at `token_uri` for a spreadsheets-scoped access token.
/// Implements [`AsyncTokenSource`] so `aliri_tokens` drives refresh
/// scheduling, jitter and error backoff.
pub struct ServiceAccountTokenSource {
    http: reqwest::Client,
    key: Arc<ServiceAccountKey>,
    signing_key: Arc<EncodingKey>,
    policy: RefreshPolicy,
}

impl ServiceAccountTokenSource {
    pub fn new(
        http: reqwest::Client,
        key: Arc<ServiceAccountKey>,
        signing_key: Arc<EncodingKey>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            http,
            key,
            signing_key,
            policy,
        }
    }

    fn signed_assertion(&self) -> Result<Zeroizing<String>, SheetsError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SheetsError::Auth(format!("system clock before unix epoch: {e}")))?
            .as_secs();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: self.key.token_uri.as_str(),
            iat,
            exp: iat + ASSERTION_LIFETIME.as_secs(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map(Zeroizing::new)
            .map_err(|e| SheetsError::Auth(format!("cannot sign token assertion: {e}")))
    }
}

#[async_trait]
impl AsyncTokenSource for ServiceAccountTokenSource {
    type Error = SheetsError;

    async fn request_token(&mut self) -> Result<TokenWithLifetime, Self::Error> {
        let assertion = self.signed_assertion()?;
        let form = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        tracing::debug!(token_uri = %self.key.token_uri, "requesting service account token");
        let response = self
            .http
            .post(self.key.token_uri.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| SheetsError::transport(&e, "token request"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SheetsError::transport(&e, "token response"))?;
        if !status.is_success() {
            return Err(match SheetsError::from_status(status, &body) {
                SheetsError::Rejected { message, .. } | SheetsError::Auth(message) => {
                    SheetsError::Auth(format!("token endpoint refused grant: {message}"))
                }
                other => other,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SheetsError::InvalidResponse(format!("token response: {e}")))?;
        if let Some(tt) = parsed.token_type.as_deref()
            && !tt.eq_ignore_ascii_case("bearer")
        {
            return Err(SheetsError::Auth(format!("unsupported token type: {tt}")));
        }

        let lifetime_secs = parsed
            .expires_in
            .unwrap_or(self.policy.default_ttl.as_secs());
        let (freshness, min_stale) = refresh_params(
            lifetime_secs,
            self.policy.refresh_offset,
            self.policy.min_refresh_period,
        );
        tracing::debug!(lifetime_secs, "service account token acquired");

        let access_token = AccessToken::new(parsed.access_token);
        Ok(TokenLifetimeConfig::new(freshness, min_stale).create_token(
            &access_token,
            None::<&IdToken>,
            DurationSecs(lifetime_secs),
        ))
    }
}

/// Returns `(freshness_period, min_staleness_period)` for a token of the given
/// lifetime. The token turns stale `refresh_offset` before expiry, or halfway
/// through its life when the offset does not fit. The stale time never passes
/// expiry.
#[allow(clippy::integer_division, clippy::cast_precision_loss)]
fn refresh_params(
    lifetime_secs: u64,
    refresh_offset: Duration,
    min_refresh_period: Duration,
) -> (f64, DurationSecs) {
    if lifetime_secs == 0 {
        return (0.0, DurationSecs(0));
    }

    let offset = refresh_offset.as_secs();
    let desired_delay = if offset < lifetime_secs {
        lifetime_secs - offset
    } else {
        lifetime_secs / 2
    };

    let freshness = (desired_delay as f64) / (lifetime_secs as f64);
    let min_stale = min_refresh_period.as_secs().min(desired_delay);

    (freshness, DurationSecs(min_stale))
}
