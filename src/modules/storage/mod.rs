//! Storage module for Google Cloud Storage
//!
//! Provides a single-bucket façade (upload, download, delete, exists, list,
//! size) over the GCS JSON API, authenticated from a credentials file.

mod cache;
mod client;
mod credentials;
mod error;
mod object;
mod service;
mod token;
mod transport;

pub use client::{
    FileContent, FileDownload, FileListing, ListedFiles, ObjectStoreClient, DEFAULT_DOWNLOAD_NAME,
};
pub use error::StorageError;
pub use object::StorageObject;
pub use service::DEFAULT_ENDPOINT;

#[cfg(test)]
pub use object::{MediaResponse, ObjectListing};
#[cfg(test)]
pub use service::StorageService;
