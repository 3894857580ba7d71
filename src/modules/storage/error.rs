//! Errors raised by the storage layer
//!
//! `NotFound` is kept apart from every other failure so callers branch on the
//! kind instead of digging a status code out of a generic error.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The service answered 404 for this object
    #[error("Object not found: {path}")]
    NotFound { path: String },

    /// Any other non-success status returned by the storage service
    #[error("Storage service error: HTTP {status} - {message}")]
    Service { status: u16, message: String },

    #[error("Storage transport error: {0}")]
    Transport(String),

    /// Access token could not be obtained
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Credentials file missing, unreadable or malformed
    #[error("Invalid credentials file: {0}")]
    Credentials(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
