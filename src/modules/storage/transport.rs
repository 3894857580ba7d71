//! Authenticated HTTP transport for Google Cloud Storage

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};

use super::credentials::GoogleCredentials;
use super::error::{Result, StorageError};
use super::token::TokenManager;

/// OAuth2 scope granted to every transport: read-write access to objects
pub const READ_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// HTTP client whose requests carry a bearer token for [`READ_WRITE_SCOPE`]
#[derive(Clone)]
pub struct AuthorizedTransport {
    client: Client,
    tokens: Arc<TokenManager>,
    credentials_path: Option<PathBuf>,
}

impl AuthorizedTransport {
    /// Build a fresh transport from a credentials file
    ///
    /// Only the file is read; connectivity is not checked until the first request.
    pub fn reconfigure(credentials_path: impl AsRef<Path>) -> Result<Self> {
        let path = credentials_path.as_ref();
        let credentials = GoogleCredentials::from_file(path)?;

        tracing::debug!(
            "Initialized GCS transport from '{}' ({:?})",
            path.display(),
            credentials
        );

        let mut transport = Self::from_credentials(credentials)?;
        transport.credentials_path = Some(path.to_path_buf());
        Ok(transport)
    }

    pub fn from_credentials(credentials: GoogleCredentials) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| StorageError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let tokens = Arc::new(TokenManager::new(
            credentials,
            READ_WRITE_SCOPE,
            client.clone(),
        ));

        Ok(Self {
            client,
            tokens,
            credentials_path: None,
        })
    }

    pub fn credentials_path(&self) -> Option<&Path> {
        self.credentials_path.as_deref()
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Attach the current access token and send the request
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.get_access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        Ok(response)
    }
}

impl std::fmt::Debug for AuthorizedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedTransport")
            .field("credentials_path", &self.credentials_path)
            .field("scope", &READ_WRITE_SCOPE)
            .finish()
    }
}
