use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        files_handlers::get_file_content,
        files_handlers::file_exists,
        files_handlers::get_file_size,
        files_handlers::list_files,
        files_handlers::upload_file,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::StoredFileDto,
            files_dtos::ListedFilesDto,
            files_dtos::FileListingDto,
            files_dtos::FileExistsDto,
            files_dtos::FileSizeDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::StoredFileDto>,
            ApiResponse<files_dtos::FileListingDto>,
            ApiResponse<files_dtos::FileExistsDto>,
            ApiResponse<files_dtos::FileSizeDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
        )
    ),
    tags(
        (name = "files", description = "Files stored in the configured Google Cloud Storage bucket"),
    ),
    info(
        title = "GCS Helper API",
        version = "0.1.0",
        description = "HTTP access to a single Google Cloud Storage bucket",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
