use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::credentials::GoogleCredentials;
use super::error::{Result, StorageError};

/// Response from the Google OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default, rename = "token_type")]
    pub _token_type: String,
}

/// Cached token with expiration tracking
struct TokenCache {
    token: TokenResponse,
    fetched_at: Instant,
}

/// Manages OAuth2 access tokens for one set of credentials, with caching
pub struct TokenManager {
    credentials: GoogleCredentials,
    scope: &'static str,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<TokenCache>>>,
    /// Refresh token this many seconds before expiration
    refresh_margin: Duration,
}

impl TokenManager {
    pub fn new(credentials: GoogleCredentials, scope: &'static str, client: reqwest::Client) -> Self {
        Self {
            credentials,
            scope,
            client,
            cache: Arc::new(RwLock::new(None)),
            refresh_margin: Duration::from_secs(60),
        }
    }

    /// Get a valid access token, fetching a new one if necessary
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                let elapsed = cached.fetched_at.elapsed();
                let expires_in = Duration::from_secs(cached.token.expires_in);

                if elapsed + self.refresh_margin < expires_in {
                    tracing::debug!(
                        "Using cached GCS access token (expires in {} seconds)",
                        (expires_in - elapsed).as_secs()
                    );
                    return Ok(cached.token.access_token.clone());
                }
            }
        }

        self.fetch_token().await
    }

    async fn fetch_token(&self) -> Result<String> {
        let token_uri = self.credentials.token_uri();
        tracing::debug!("Fetching new GCS access token from {}", token_uri);

        let form = self.credentials.token_request_form(self.scope)?;

        let response = self
            .client
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| StorageError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Auth(format!(
                "Token request failed: HTTP {} - {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Auth(format!("Failed to parse token response: {}", e)))?;

        tracing::info!(
            "Fetched new GCS access token, expires in {} seconds",
            token_response.expires_in
        );

        let access_token = token_response.access_token.clone();

        let mut cache = self.cache.write().await;
        *cache = Some(TokenCache {
            token: token_response,
            fetched_at: Instant::now(),
        });

        Ok(access_token)
    }
}
