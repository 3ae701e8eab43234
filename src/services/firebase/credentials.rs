use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::{config::FirebaseConfig, error::StoreError};

/// OAuth2 scopes required to write to the Realtime Database.
pub const DATABASE_SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

/// Lifetime requested for each signed assertion (Google caps this at one hour).
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Service account identity used to mint access tokens.
#[derive(Clone)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    private_key: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccount {
    pub fn new(project_id: String, client_email: String, private_key: &str) -> Self {
        Self {
            project_id,
            client_email,
            private_key: unescape_private_key(private_key),
        }
    }

    pub fn from_config(config: &FirebaseConfig) -> Self {
        Self::new(
            config.firebase_project_id.clone(),
            config.firebase_client_email.clone(),
            &config.firebase_private_key,
        )
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Sign a JWT bearer assertion for the token endpoint at `audience`.
    ///
    /// The key is parsed here rather than at construction, so a missing or
    /// malformed key only fails the request that needs a token.
    pub fn sign_assertion(&self, audience: &str, now: DateTime<Utc>) -> Result<String, StoreError> {
        if self.client_email.is_empty() {
            return Err(StoreError::Credentials(
                "service account client email is not configured".to_string(),
            ));
        }

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid private key: {}", e)))?;

        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATABASE_SCOPES,
            aud: audience,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Credentials(format!("failed to sign assertion: {}", e)))
    }
}

/// Environment-stored PEM keys carry literal `\n` sequences instead of newlines.
pub fn unescape_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}
