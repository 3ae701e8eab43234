use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::Duration;

use super::{credentials::ServiceAccount, token::TokenProvider};
use crate::{
    config::FirebaseConfig, error::StoreError, models::CoordinateRecord,
    services::store::CoordinateStore,
};

/// Applies to token exchanges as well as writes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Body returned by a Realtime Database `POST` (push).
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: Option<serde_json::Value>,
}

/// REST client for a Firebase Realtime Database.
pub struct RealtimeDatabase {
    http: Client,
    database_url: String,
    tokens: TokenProvider,
}

impl RealtimeDatabase {
    pub fn new(config: &FirebaseConfig) -> Result<Self, StoreError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &FirebaseConfig, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .user_agent(concat!("gps-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {}", e)))?;

        let account = ServiceAccount::from_config(config);
        tracing::info!(
            "Realtime Database client for project {} at {}",
            account.project_id,
            config.firebase_database_url
        );

        Ok(Self {
            tokens: TokenProvider::new(http.clone(), account, config.firebase_token_uri.clone()),
            database_url: config.firebase_database_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn child_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }

    /// Append `value` as a new child of `path` and return the generated push key.
    pub async fn push<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<Option<String>, StoreError> {
        if self.database_url.is_empty() {
            return Err(StoreError::Request("database URL is not configured".to_string()));
        }

        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(self.child_url(path))
            .query(&[("access_token", token.as_str())])
            .json(value)
            .send()
            .await
            .map_err(|e| {
                let mut message = format!("push to {} failed: {}", path, e);
                let mut source = e.source();
                while let Some(err) = source {
                    message.push_str(&format!("\n  Caused by: {}", err));
                    source = err.source();
                }
                StoreError::Request(message)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: PushResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Request(format!("failed to parse push response: {}", e)))?;

        Ok(body
            .name
            .and_then(|name| name.as_str().map(str::to_string)))
    }
}

#[async_trait]
impl CoordinateStore for RealtimeDatabase {
    async fn append_child(
        &self,
        path: &str,
        record: &CoordinateRecord,
    ) -> Result<Option<String>, StoreError> {
        let key = self.push(path, record).await?;
        tracing::debug!("Appended record under {} with key {:?}", path, key);
        Ok(key)
    }
}
