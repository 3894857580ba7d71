//! Google Cloud Storage façade
//!
//! Upload, download, delete, existence, listing and size of objects in one
//! bucket. The descriptor of the most recently fetched object is memoized so
//! an existence check followed by a size or content read costs one metadata
//! round trip.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info};

use super::cache::ObjectCache;
use super::error::{Result, StorageError};
use super::object::StorageObject;
use super::service::{GcsStorageService, StorageService, DEFAULT_ENDPOINT};
use super::transport::AuthorizedTransport;

/// Hierarchy delimiter used for listings
const DELIMITER: &str = "/";

/// Download name used when the caller gives none
pub const DEFAULT_DOWNLOAD_NAME: &str = "file";

const CONTENT_TRANSFER_ENCODING: &str = "content-transfer-encoding";

lazy_static! {
    /// Anything outside `[A-Za-z0-9]` is replaced in download file names
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9]").unwrap();
}

/// Attachment-style response for an object download
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of [`ObjectStoreClient::get_file`]
#[derive(Debug, Clone)]
pub enum FileContent {
    Raw(Bytes),
    Download(FileDownload),
}

/// Objects of a listing, as names or full descriptors
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListedFiles {
    Names(Vec<String>),
    Objects(Vec<StorageObject>),
}

#[cfg(test)]
impl ListedFiles {
    pub fn len(&self) -> usize {
        match self {
            ListedFiles::Names(names) => names.len(),
            ListedFiles::Objects(objects) => objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileListing {
    /// Common prefixes under the listed prefix, each ending in `/`
    pub dirs: Vec<String>,
    pub files: ListedFiles,
}

/// Stateful client bound to one bucket
///
/// Operations take `&mut self`: the cached descriptor is plain mutable state,
/// so shared use needs external locking.
pub struct ObjectStoreClient {
    service: Arc<dyn StorageService>,
    bucket: String,
    cache_enabled: bool,
    cache: ObjectCache,
    credentials_path: Option<PathBuf>,
    endpoint: String,
}

#[allow(dead_code)]
impl ObjectStoreClient {
    /// Create a client against the public GCS endpoint
    ///
    /// # Arguments
    /// * `credentials_path` - Google credentials JSON (service account or authorized user)
    /// * `bucket` - Bucket every operation targets
    /// * `cache_enabled` - Memoize the last fetched descriptor
    pub fn new(
        credentials_path: impl AsRef<Path>,
        bucket: impl Into<String>,
        cache_enabled: bool,
    ) -> Result<Self> {
        Self::with_endpoint(credentials_path, bucket, cache_enabled, DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (emulators, private gateways)
    pub fn with_endpoint(
        credentials_path: impl AsRef<Path>,
        bucket: impl Into<String>,
        cache_enabled: bool,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let transport = AuthorizedTransport::reconfigure(credentials_path)?;
        let credentials_path = transport.credentials_path().map(Path::to_path_buf);
        let service = GcsStorageService::new(transport, endpoint.clone());

        let mut client = Self::with_service(Arc::new(service), bucket, cache_enabled);
        client.credentials_path = credentials_path;
        client.endpoint = endpoint;

        info!(
            "GCS client initialized for bucket: {}, endpoint: {}, cache: {}",
            client.bucket, client.endpoint, client.cache_enabled
        );

        Ok(client)
    }

    /// Create a client over an arbitrary storage service
    pub fn with_service(
        service: Arc<dyn StorageService>,
        bucket: impl Into<String>,
        cache_enabled: bool,
    ) -> Self {
        Self {
            service,
            bucket: bucket.into(),
            cache_enabled,
            cache: ObjectCache::default(),
            credentials_path: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Rebuild the authenticated transport from another credentials file
    ///
    /// On error the current transport is kept.
    pub fn reconfigure(&mut self, credentials_path: impl AsRef<Path>) -> Result<()> {
        let path = credentials_path.as_ref();
        let transport = AuthorizedTransport::reconfigure(path)?;

        self.credentials_path = transport.credentials_path().map(Path::to_path_buf);
        self.service = Arc::new(GcsStorageService::new(transport, self.endpoint.clone()));
        self.cache.clear();

        info!("GCS credentials reconfigured from '{}'", path.display());
        Ok(())
    }

    pub fn credentials_path(&self) -> Option<&Path> {
        self.credentials_path.as_deref()
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub fn set_bucket_name(&mut self, bucket: impl Into<String>) -> &mut Self {
        self.bucket = bucket.into();
        self.cache.clear();
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) -> &mut Self {
        self.cache_enabled = enabled;
        self
    }

    /// Fetch the descriptor of `path`, honoring the single-slot cache
    ///
    /// A 404 is returned as `StorageError::NotFound`; the helpers above this
    /// turn it into an absent result.
    pub async fn get_object(&mut self, path: &str) -> Result<&StorageObject> {
        if self.cache_enabled && self.cache.lookup(path).is_some() {
            debug!("Object cache hit for '{}'", path);
        } else {
            self.cache.clear();

            let object = self.service.get_object(&self.bucket, path).await?;
            self.cache.store(path, object);
        }

        self.cache.object().ok_or_else(|| StorageError::NotFound {
            path: path.to_string(),
        })
    }

    /// Check if a file exists in the bucket
    ///
    /// # Returns
    /// `false` only when the service reports 404; any other failure is returned as an error
    pub async fn file_exists(&mut self, path: &str) -> Result<bool> {
        match self.get_object(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size of a file in bytes, `None` if it does not exist
    pub async fn get_file_size(&mut self, path: &str) -> Result<Option<u64>> {
        if !self.file_exists(path).await? {
            return Ok(None);
        }

        Ok(self.cache.object().map(|object| object.size))
    }

    /// Download a file
    ///
    /// # Arguments
    /// * `path` - Object path in the bucket
    /// * `content_only` - Return the raw bytes instead of an attachment response
    /// * `download_name` - File name announced in `Content-Disposition` (sanitized)
    ///
    /// # Returns
    /// `None` if the object does not exist
    pub async fn get_file(
        &mut self,
        path: &str,
        content_only: bool,
        download_name: &str,
    ) -> Result<Option<FileContent>> {
        if !self.file_exists(path).await? {
            return Ok(None);
        }

        let (media_link, stored_type) = match self.cache.object() {
            Some(object) => (object.media_link.clone(), object.content_type.clone()),
            None => return Ok(None),
        };

        let media = self.service.download(&media_link).await?;
        debug!(
            "Downloaded '{}' ({} bytes) from bucket '{}'",
            path,
            media.body.len(),
            self.bucket
        );

        if content_only {
            return Ok(Some(FileContent::Raw(media.body)));
        }

        let content_type = media
            .content_type
            .or(stored_type)
            .and_then(|ct| HeaderValue::from_str(&ct).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

        let disposition = format!(
            "attachment; filename={}",
            sanitize_download_name(download_name)
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(
            CONTENT_TRANSFER_ENCODING,
            HeaderValue::from_static("Binary"),
        );
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .map_err(|e| StorageError::Transport(format!("Invalid header value: {}", e)))?,
        );

        Ok(Some(FileContent::Download(FileDownload {
            status: StatusCode::OK,
            headers,
            body: media.body,
        })))
    }

    /// Delete a file; no existence check is made first
    pub async fn delete_file(&mut self, path: &str) -> Result<()> {
        self.service.delete_object(&self.bucket, path).await?;
        self.cache.invalidate(path);

        info!("Deleted '{}' from bucket '{}'", path, self.bucket);
        Ok(())
    }

    /// List files and pseudo-directories directly under `prefix`
    ///
    /// The zero-length object some tools create to mark a "directory" shares
    /// the prefix's own name and is left out of `files`.
    pub async fn list_files(&mut self, prefix: &str, names_only: bool) -> Result<FileListing> {
        let prefix = normalize_prefix(prefix);

        let mut dirs = Vec::new();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .service
                .list_objects(&self.bucket, &prefix, DELIMITER, page_token.as_deref())
                .await?;

            dirs.extend(page.prefixes);
            items.extend(page.items.into_iter().filter(|item| item.name != prefix));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "Listed '{}' in bucket '{}': {} dirs, {} files",
            prefix,
            self.bucket,
            dirs.len(),
            items.len()
        );

        let files = if names_only {
            ListedFiles::Names(items.into_iter().map(|item| item.name).collect())
        } else {
            ListedFiles::Objects(items)
        };

        Ok(FileListing { dirs, files })
    }

    /// Upload a local file to `target_path` in one multipart request
    ///
    /// The whole file is read into memory; the MIME type is guessed from its extension.
    pub async fn upload_file(
        &mut self,
        source_path: impl AsRef<Path>,
        target_path: &str,
    ) -> Result<StorageObject> {
        let source_path = source_path.as_ref();
        let data = tokio::fs::read(source_path).await?;
        let content_type = mime_guess::from_path(source_path).first_or_octet_stream();

        self.upload_data(Bytes::from(data), content_type.essence_str(), target_path)
            .await
    }

    /// Upload in-memory content to `target_path` in one multipart request
    pub async fn upload_data(
        &mut self,
        data: Bytes,
        content_type: &str,
        target_path: &str,
    ) -> Result<StorageObject> {
        let size = data.len();
        let object = self
            .service
            .insert_object(&self.bucket, target_path, data, content_type)
            .await?;
        self.cache.invalidate(target_path);

        info!(
            "Uploaded '{}' ({} bytes) to bucket '{}'",
            target_path, size, self.bucket
        );
        Ok(object)
    }
}

/// Trim trailing slashes and append exactly one; the root becomes the empty prefix
pub fn normalize_prefix(prefix: &str) -> String {
    let normalized = format!("{}/", prefix.trim_end_matches('/'));
    if normalized == "/" {
        String::new()
    } else {
        normalized
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize_download_name(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}
