//! Google credentials files
//!
//! Supports the two JSON layouts Google tooling produces:
//! `service_account` keys and `authorized_user` refresh tokens.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::error::{Result, StorageError};

/// Google OAuth2 token endpoint used when the file does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for service account assertions
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthorizedUserKey {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Raw credentials file, discriminated by its `type` field
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserKey),
}

/// Parsed credentials, ready to request access tokens
#[derive(Clone)]
pub enum GoogleCredentials {
    ServiceAccount {
        key: ServiceAccountKey,
        signing_key: EncodingKey,
    },
    AuthorizedUser(AuthorizedUserKey),
}

impl std::fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoogleCredentials::ServiceAccount { key, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .field("token_uri", &key.token_uri)
                .finish_non_exhaustive(),
            GoogleCredentials::AuthorizedUser(key) => f
                .debug_struct("AuthorizedUser")
                .field("client_id", &key.client_id)
                .field("token_uri", &key.token_uri)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl GoogleCredentials {
    /// Read and parse a credentials file
    ///
    /// No network I/O happens here; tokens are requested on first use.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Credentials(format!("Failed to read '{}': {}", path.display(), e))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            StorageError::Credentials(msg) => {
                StorageError::Credentials(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(content)
            .map_err(|e| StorageError::Credentials(format!("Malformed credentials: {}", e)))?;

        match file {
            CredentialsFile::ServiceAccount(key) => {
                let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
                    .map_err(|e| StorageError::Credentials(format!("Invalid private key: {}", e)))?;
                Ok(GoogleCredentials::ServiceAccount { key, signing_key })
            }
            CredentialsFile::AuthorizedUser(key) => Ok(GoogleCredentials::AuthorizedUser(key)),
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            GoogleCredentials::ServiceAccount { key, .. } => &key.token_uri,
            GoogleCredentials::AuthorizedUser(key) => &key.token_uri,
        }
    }

    /// Form parameters for the token endpoint
    pub fn token_request_form(&self, scope: &str) -> Result<Vec<(&'static str, String)>> {
        match self {
            GoogleCredentials::ServiceAccount { key, signing_key } => {
                let iat = Utc::now().timestamp();
                let claims = AssertionClaims {
                    iss: &key.client_email,
                    scope,
                    aud: &key.token_uri,
                    iat,
                    exp: iat + ASSERTION_LIFETIME_SECS,
                };

                let mut header = Header::new(Algorithm::RS256);
                header.kid = key.private_key_id.clone();

                let assertion = jsonwebtoken::encode(&header, &claims, signing_key)
                    .map_err(|e| StorageError::Auth(format!("Failed to sign assertion: {}", e)))?;

                Ok(vec![
                    (
                        "grant_type",
                        "urn:ietf:params:oauth:grant-type:jwt-bearer".to_string(),
                    ),
                    ("assertion", assertion),
                ])
            }
            GoogleCredentials::AuthorizedUser(key) => Ok(vec![
                ("grant_type", "refresh_token".to_string()),
                ("client_id", key.client_id.clone()),
                ("client_secret", key.client_secret.clone()),
                ("refresh_token", key.refresh_token.clone()),
                ("scope", scope.to_string()),
            ]),
        }
    }
}
