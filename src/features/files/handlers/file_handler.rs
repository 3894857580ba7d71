use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileContentQuery, FileExistsDto, FileListingDto, FilePathQuery,
    FileSizeDto, ListFilesQuery, StoredFileDto, UploadFileDto,
};
use crate::features::files::services::FileService;
use crate::modules::storage::{FileContent, FileDownload};
use crate::shared::types::ApiResponse;

impl IntoResponse for FileDownload {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

impl IntoResponse for FileContent {
    fn into_response(self) -> Response {
        match self {
            FileContent::Raw(body) => body.into_response(),
            FileContent::Download(download) => download.into_response(),
        }
    }
}

/// Download a file
///
/// Returns the raw object content, or an attachment response with
/// `Content-Disposition` when `download=true`.
#[utoipa::path(
    get,
    path = "/api/files/content",
    tag = "files",
    params(FileContentQuery),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Missing path"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn get_file_content(
    State(service): State<Arc<FileService>>,
    Query(query): Query<FileContentQuery>,
) -> Result<Response, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let content = service
        .get_file(&query.path, query.download, query.filename.as_deref())
        .await?;

    Ok(content.into_response())
}

/// Check whether a file exists
#[utoipa::path(
    get,
    path = "/api/files/exists",
    tag = "files",
    params(FilePathQuery),
    responses(
        (status = 200, description = "Existence of the file", body = ApiResponse<FileExistsDto>),
        (status = 400, description = "Missing path"),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn file_exists(
    State(service): State<Arc<FileService>>,
    Query(query): Query<FilePathQuery>,
) -> Result<Json<ApiResponse<FileExistsDto>>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.file_exists(&query.path).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

/// Get the size of a file in bytes
#[utoipa::path(
    get,
    path = "/api/files/size",
    tag = "files",
    params(FilePathQuery),
    responses(
        (status = 200, description = "Size of the file", body = ApiResponse<FileSizeDto>),
        (status = 400, description = "Missing path"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn get_file_size(
    State(service): State<Arc<FileService>>,
    Query(query): Query<FilePathQuery>,
) -> Result<Json<ApiResponse<FileSizeDto>>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.get_file_size(&query.path).await?;
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

/// List files and directories under a prefix
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Directories and files under the prefix", body = ApiResponse<FileListingDto>),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<FileListingDto>>, AppError> {
    let listing = service.list_files(&query.prefix, query.names_only).await?;
    Ok(Json(ApiResponse::success(Some(listing), None, None)))
}

/// Upload a file
///
/// Accepts multipart/form-data with:
/// - `file`: The file to upload (required)
/// - `path`: Target object path inside the bucket (required)
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File content and its target path",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<StoredFileDto>),
        (status = 400, description = "Missing file or path"),
        (status = 413, description = "File too large"),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<StoredFileDto>>), AppError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;
    let mut target_path: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                content_type = field.content_type().map(|s| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                file_data = Some(data.to_vec());
            }
            "path" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read path field: {}", e))
                })?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    target_path = Some(text);
                }
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let target_path =
        target_path.ok_or_else(|| AppError::BadRequest("Path is required".to_string()))?;

    // Browsers send octet-stream for unknown types; the target extension is a better guess
    let content_type = content_type
        .filter(|ct| ct != "application/octet-stream")
        .unwrap_or_else(|| {
            mime_guess::from_path(&target_path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    let stored = service
        .upload_file(file_data, &content_type, &target_path)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(stored),
            Some("File uploaded successfully".to_string()),
            None,
        )),
    ))
}

/// Delete a file
///
/// No existence check is made; deleting a missing file returns 404.
#[utoipa::path(
    delete,
    path = "/api/files",
    tag = "files",
    params(FilePathQuery),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 400, description = "Missing path"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Storage service error")
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    Query(query): Query<FilePathQuery>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_file(&query.path).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::routes;
    use crate::modules::storage::ObjectStoreClient;
    use crate::shared::test_helpers::InMemoryStorage;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::Value;

    const BUCKET: &str = "test-bucket";

    fn server_with(storage: Arc<InMemoryStorage>) -> TestServer {
        let client = ObjectStoreClient::with_service(storage, BUCKET, true);
        let service = Arc::new(FileService::new(client));
        TestServer::new(routes(service, 1024 * 1024)).unwrap()
    }

    fn seeded() -> Arc<InMemoryStorage> {
        let storage = Arc::new(InMemoryStorage::new());
        storage.put(BUCKET, "docs/readme.txt", b"hello", "text/plain");
        storage.put(BUCKET, "docs/img/logo.png", b"png", "image/png");
        storage.put(BUCKET, "root.bin", b"\x00\x01", "application/octet-stream");
        storage
    }

    #[tokio::test]
    async fn test_get_raw_content() {
        let server = server_with(seeded());

        let response = server
            .get("/api/files/content")
            .add_query_param("path", "docs/readme.txt")
            .await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_download_sets_attachment_headers() {
        let server = server_with(seeded());

        let response = server
            .get("/api/files/content")
            .add_query_param("path", "docs/readme.txt")
            .add_query_param("download", "true")
            .add_query_param("filename", "read me.txt")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=read_me_txt"
        );
        assert_eq!(response.header("content-type"), "text/plain");
        assert_eq!(response.as_bytes().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_missing_content_is_not_found() {
        let server = server_with(seeded());

        let response = server
            .get("/api/files/content")
            .add_query_param("path", "docs/missing.txt")
            .await;

        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_empty_path_is_rejected() {
        let server = server_with(seeded());

        let response = server
            .get("/api/files/exists")
            .add_query_param("path", "")
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_exists_and_size() {
        let server = server_with(seeded());

        let exists: Value = server
            .get("/api/files/exists")
            .add_query_param("path", "docs/readme.txt")
            .await
            .json();
        assert_eq!(exists["data"]["exists"], true);

        let missing: Value = server
            .get("/api/files/exists")
            .add_query_param("path", "nope.txt")
            .await
            .json();
        assert_eq!(missing["data"]["exists"], false);

        let size: Value = server
            .get("/api/files/size")
            .add_query_param("path", "docs/readme.txt")
            .await
            .json();
        assert_eq!(size["data"]["size"], 5);

        server
            .get("/api/files/size")
            .add_query_param("path", "nope.txt")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_list_names_and_objects() {
        let server = server_with(seeded());

        let names: Value = server
            .get("/api/files")
            .add_query_param("prefix", "docs")
            .await
            .json();
        assert_eq!(names["data"]["dirs"], serde_json::json!(["docs/img/"]));
        assert_eq!(names["data"]["files"], serde_json::json!(["docs/readme.txt"]));

        let objects: Value = server
            .get("/api/files")
            .add_query_param("prefix", "/")
            .add_query_param("names_only", "false")
            .await
            .json();
        assert_eq!(objects["data"]["dirs"], serde_json::json!(["docs/"]));
        assert_eq!(objects["data"]["files"][0]["name"], "root.bin");
        assert_eq!(objects["data"]["files"][0]["size"], 2);
    }

    #[tokio::test]
    async fn test_upload_then_delete() {
        let storage = seeded();
        let server = server_with(Arc::clone(&storage));

        let form = MultipartForm::new().add_text("path", "up/notes.json").add_part(
            "file",
            Part::bytes(b"{}".to_vec())
                .file_name("notes.json")
                .mime_type("application/octet-stream"),
        );

        let response = server.post("/api/files/upload").multipart(form).await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["name"], "up/notes.json");
        assert_eq!(body["data"]["content_type"], "application/json");
        assert!(storage.contains(BUCKET, "up/notes.json"));

        server
            .delete("/api/files")
            .add_query_param("path", "up/notes.json")
            .await
            .assert_status_ok();
        assert!(!storage.contains(BUCKET, "up/notes.json"));

        server
            .delete("/api/files")
            .add_query_param("path", "up/notes.json")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_upload_requires_path() {
        let server = server_with(seeded());

        let form = MultipartForm::new()
            .add_part("file", Part::bytes(b"x".to_vec()).file_name("x.txt"));

        server
            .post("/api/files/upload")
            .multipart(form)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_service_failure_maps_to_bad_gateway() {
        let storage = seeded();
        storage.fail_with(BUCKET, "docs/readme.txt", 503);
        let server = server_with(storage);

        server
            .get("/api/files/exists")
            .add_query_param("path", "docs/readme.txt")
            .await
            .assert_status(StatusCode::BAD_GATEWAY);
    }
}
