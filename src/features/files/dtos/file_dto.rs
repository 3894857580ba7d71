use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::modules::storage::{FileListing, ListedFiles, StorageObject};

/// Query selecting one object by path
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct FilePathQuery {
    /// Object path inside the bucket (e.g. "reports/2024/summary.pdf")
    #[validate(length(min = 1, message = "path is required"))]
    pub path: String,
}

/// Query for downloading an object
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct FileContentQuery {
    /// Object path inside the bucket
    #[validate(length(min = 1, message = "path is required"))]
    pub path: String,
    /// Serve as an attachment (`Content-Disposition`) instead of raw content
    #[serde(default)]
    pub download: bool,
    /// File name announced to the browser; non-alphanumerics become `_`
    pub filename: Option<String>,
}

/// Query for listing a prefix
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Prefix ("directory") to list; empty or "/" lists the bucket root
    #[serde(default)]
    pub prefix: String,
    /// Return only object names (default) or full descriptors
    #[serde(default = "default_names_only")]
    pub names_only: bool,
}

fn default_names_only() -> bool {
    true
}

/// Upload form for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Target object path inside the bucket
    #[schema(example = "uploads/report.pdf")]
    pub path: String,
}

/// Descriptor of a stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredFileDto {
    /// Full object path inside the bucket
    pub name: String,
    pub bucket: String,
    /// Size in bytes
    pub size: u64,
    pub content_type: Option<String>,
    /// Last modification time (RFC 3339)
    pub updated: Option<String>,
}

impl From<StorageObject> for StoredFileDto {
    fn from(object: StorageObject) -> Self {
        Self {
            name: object.name,
            bucket: object.bucket,
            size: object.size,
            content_type: object.content_type,
            updated: object.updated,
        }
    }
}

/// Listed objects: names only, or full descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ListedFilesDto {
    Names(Vec<String>),
    Objects(Vec<StoredFileDto>),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileListingDto {
    /// Pseudo-directories directly under the prefix, each ending in "/"
    pub dirs: Vec<String>,
    pub files: ListedFilesDto,
}

impl From<FileListing> for FileListingDto {
    fn from(listing: FileListing) -> Self {
        let files = match listing.files {
            ListedFiles::Names(names) => ListedFilesDto::Names(names),
            ListedFiles::Objects(objects) => {
                ListedFilesDto::Objects(objects.into_iter().map(StoredFileDto::from).collect())
            }
        };

        Self {
            dirs: listing.dirs,
            files,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileExistsDto {
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileSizeDto {
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
}
