//! Access tokens for the GKE API.
//!
//! Tokens come from the GCE metadata server of the service account the bot
//! runs as, and are cached in memory until shortly before they expire.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::GkeError;

/// Metadata server path for the default service account's token.
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh tokens this many seconds before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// OAuth access token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token.
    pub token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

impl AccessToken {
    /// Whether the token expires within `secs` seconds.
    #[must_use]
    pub fn expires_within(&self, secs: i64) -> bool {
        chrono::Utc::now().timestamp() + secs >= self.expires_at
    }
}

/// Response from the metadata server's token endpoint.
#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

/// Supplies bearer tokens for GKE requests.
#[derive(Clone)]
pub struct TokenProvider {
    inner: Arc<TokenSource>,
}

enum TokenSource {
    Static(SecretString),
    Metadata {
        client: reqwest::Client,
        host: String,
        /// In-memory token cache
        cached: RwLock<Option<AccessToken>>,
    },
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.as_ref() {
            TokenSource::Static(_) => f.debug_tuple("TokenProvider::Static").field(&"[REDACTED]").finish(),
            TokenSource::Metadata { host, .. } => f
                .debug_struct("TokenProvider::Metadata")
                .field("host", host)
                .finish_non_exhaustive(),
        }
    }
}

impl TokenProvider {
    /// Always hand out the same token.
    #[must_use]
    pub fn fixed(token: SecretString) -> Self {
        Self {
            inner: Arc::new(TokenSource::Static(token)),
        }
    }

    /// Fetch tokens from the metadata server at `host`.
    #[must_use]
    pub fn metadata(client: reqwest::Client, host: &str) -> Self {
        Self {
            inner: Arc::new(TokenSource::Metadata {
                client,
                host: host.trim_end_matches('/').to_string(),
                cached: RwLock::new(None),
            }),
        }
    }

    /// Get a token valid for at least the next minute.
    ///
    /// # Errors
    ///
    /// Returns `GkeError::Auth` if the metadata server cannot be reached or
    /// refuses to issue a token.
    pub async fn access_token(&self) -> Result<SecretString, GkeError> {
        match self.inner.as_ref() {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata {
                client,
                host,
                cached,
            } => {
                if let Some(token) = cached.read().await.as_ref()
                    && !token.expires_within(EXPIRY_MARGIN_SECS)
                {
                    return Ok(token.token.clone());
                }

                let mut guard = cached.write().await;
                // Another request may have refreshed while we waited
                if let Some(token) = guard.as_ref()
                    && !token.expires_within(EXPIRY_MARGIN_SECS)
                {
                    return Ok(token.token.clone());
                }

                let token = fetch_metadata_token(client, host).await?;
                let secret = token.token.clone();
                *guard = Some(token);
                Ok(secret)
            }
        }
    }
}

#[instrument(skip(client))]
async fn fetch_metadata_token(client: &reqwest::Client, host: &str) -> Result<AccessToken, GkeError> {
    let now = chrono::Utc::now().timestamp();

    let response = client
        .get(format!("{host}{TOKEN_PATH}"))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| GkeError::Auth(format!("metadata server unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(GkeError::Auth(format!("HTTP {status}: {error_text}")));
    }

    let body: MetadataTokenResponse = response
        .json()
        .await
        .map_err(|e| GkeError::Auth(format!("invalid token response: {e}")))?;

    debug!(expires_in = body.expires_in, "Fetched access token from metadata server");

    Ok(AccessToken {
        token: SecretString::from(body.access_token),
        expires_at: now + body.expires_in,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fixed_token_is_returned_as_is() {
        let provider = TokenProvider::fixed(SecretString::from("ya29.static"));
        assert_eq!(provider.access_token().await.unwrap().expose_secret(), "ya29.static");
    }

    #[tokio::test]
    async fn metadata_token_is_fetched_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.from-metadata",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::metadata(reqwest::Client::new(), &server.uri());

        for _ in 0..3 {
            let token = provider.access_token().await.unwrap();
            assert_eq!(token.expose_secret(), "ya29.from-metadata");
        }
    }

    #[tokio::test]
    async fn nearly_expired_token_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.short-lived",
                "expires_in": 30
            })))
            .expect(2)
            .mount(&server)
            .await;

        let provider = TokenProvider::metadata(reqwest::Client::new(), &server.uri());
        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn metadata_error_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no service account"))
            .mount(&server)
            .await;

        let provider = TokenProvider::metadata(reqwest::Client::new(), &server.uri());
        let result = provider.access_token().await;
        assert!(matches!(result, Err(GkeError::Auth(_))));
    }

    #[test]
    fn expires_within_compares_against_now() {
        let now = chrono::Utc::now().timestamp();
        let token = AccessToken {
            token: SecretString::from("t"),
            expires_at: now + 120,
        };
        assert!(!token.expires_within(60));
        assert!(token.expires_within(300));
    }
}
