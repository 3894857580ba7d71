use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, file_exists, get_file_content, get_file_size, list_files, upload_file,
};
use crate::features::files::services::FileService;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, max_upload_size: usize) -> Router {
    Router::new()
        .route("/api/files", get(list_files).delete(delete_file))
        .route("/api/files/content", get(get_file_content))
        .route("/api/files/exists", get(file_exists))
        .route("/api/files/size", get(get_file_size))
        .route(
            "/api/files/upload",
            // Allow body size up to max_upload_size + buffer for multipart overhead
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_size + 1024 * 1024)),
        )
        .with_state(file_service)
}
