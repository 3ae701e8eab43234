use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::credentials::ServiceAccount;
use crate::error::StoreError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before Google reports them expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges signed service account assertions for OAuth2 access tokens and
/// caches the result until shortly before it expires.
pub struct TokenProvider {
    http: Client,
    account: ServiceAccount,
    token_uri: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: Client, account: ServiceAccount, token_uri: String) -> Self {
        Self {
            http,
            account,
            token_uri,
            cached: RwLock::new(None),
        }
    }

    /// Return a valid access token, minting a new one when the cache is empty or stale.
    pub async fn access_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, StoreError> {
        let now = Utc::now();
        let assertion = self.account.sign_assertion(&self.token_uri, now)?;

        tracing::debug!(
            "Requesting access token for {} from {}",
            self.account.client_email,
            self.token_uri
        );

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Token(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Token endpoint returned HTTP {}", status);
            return Err(StoreError::Token(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Token(format!("failed to parse token response: {}", e)))?;

        let expires_at = Duration::try_seconds(body.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                StoreError::Token(format!("invalid expires_in {} in token response", body.expires_in))
            })?;

        Ok(CachedToken {
            value: body.access_token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const TEST_KEY: &str = include_str!("../../../tests/fixtures/service_account_key.pem");

    fn provider(token_uri: String) -> TokenProvider {
        let account = ServiceAccount::new(
            "tracker".to_string(),
            "svc@tracker.iam.gserviceaccount.com".to_string(),
            TEST_KEY,
        );
        TokenProvider::new(Client::new(), account, token_uri)
    }

    #[test]
    fn test_cached_token_freshness_respects_margin() {
        let now = Utc::now();
        let fresh = CachedToken {
            value: "a".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECS + 10),
        };
        let stale = CachedToken {
            value: "b".into(),
            expires_at: now + Duration::seconds(EXPIRY_MARGIN_SECS - 10),
        };

        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_reused() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), JWT_BEARER_GRANT.into()),
                Matcher::Regex("assertion=".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let provider = provider(format!("{}/token", server.url()));

        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.token");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"short","expires_in":30}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = provider(format!("{}/token", server.url()));

        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_a_token_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"t","expires_in":10000000000000}"#)
            .create_async()
            .await;

        let provider = provider(format!("{}/token", server.url()));

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, StoreError::Token(ref msg) if msg.contains("expires_in")));
    }

    #[tokio::test]
    async fn test_rejected_assertion_is_a_token_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let provider = provider(format!("{}/token", server.url()));

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, StoreError::Token(ref msg) if msg.contains("invalid_grant")));
    }
}
