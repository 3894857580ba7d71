use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{FileExistsDto, FileListingDto, FileSizeDto, StoredFileDto};
use crate::modules::storage::{FileContent, ObjectStoreClient, DEFAULT_DOWNLOAD_NAME};

/// Service for file operations on the configured bucket
///
/// The storage client keeps its last-object cache as plain mutable state, so
/// every request takes the lock for the whole fetch-and-cache sequence.
pub struct FileService {
    client: Mutex<ObjectStoreClient>,
}

impl FileService {
    pub fn new(client: ObjectStoreClient) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    pub async fn bucket_name(&self) -> String {
        self.client.lock().await.bucket_name().to_string()
    }

    /// Fetch a file's content
    ///
    /// # Arguments
    /// * `path` - Object path in the bucket
    /// * `download` - Build an attachment response instead of returning raw bytes
    /// * `filename` - Download name, defaults to "file"
    pub async fn get_file(
        &self,
        path: &str,
        download: bool,
        filename: Option<&str>,
    ) -> Result<FileContent> {
        let name = filename
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DOWNLOAD_NAME);

        self.client
            .lock()
            .await
            .get_file(path, !download, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", path)))
    }

    pub async fn file_exists(&self, path: &str) -> Result<FileExistsDto> {
        let exists = self.client.lock().await.file_exists(path).await?;
        debug!("File '{}' exists: {}", path, exists);

        Ok(FileExistsDto {
            path: path.to_string(),
            exists,
        })
    }

    pub async fn get_file_size(&self, path: &str) -> Result<FileSizeDto> {
        let size = self
            .client
            .lock()
            .await
            .get_file_size(path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File '{}' not found", path)))?;

        Ok(FileSizeDto {
            path: path.to_string(),
            size,
        })
    }

    pub async fn list_files(&self, prefix: &str, names_only: bool) -> Result<FileListingDto> {
        let listing = self
            .client
            .lock()
            .await
            .list_files(prefix, names_only)
            .await?;

        Ok(listing.into())
    }

    /// Upload content to `path`, replacing any existing object
    pub async fn upload_file(
        &self,
        data: Vec<u8>,
        content_type: &str,
        path: &str,
    ) -> Result<StoredFileDto> {
        let object = self
            .client
            .lock()
            .await
            .upload_data(Bytes::from(data), content_type, path)
            .await?;

        info!(
            "File stored: name={}, size={}, content_type={}",
            object.name,
            object.size,
            object.content_type.as_deref().unwrap_or(content_type)
        );

        Ok(object.into())
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.client.lock().await.delete_file(path).await?;
        Ok(())
    }
}
