//! Remote storage service
//!
//! [`StorageService`] is the seam between the façade and the backend.
//! [`GcsStorageService`] speaks the GCS JSON API; tests plug in an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::error::{Result, StorageError};
use super::object::{MediaResponse, ObjectListing, StorageObject};
use super::transport::AuthorizedTransport;

/// Public GCS endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Fetch object metadata; `StorageError::NotFound` on 404
    async fn get_object(&self, bucket: &str, path: &str) -> Result<StorageObject>;

    /// One page of a delimited prefix listing
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_token: Option<&str>,
    ) -> Result<ObjectListing>;

    /// Single-shot multipart upload
    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StorageObject>;

    async fn delete_object(&self, bucket: &str, path: &str) -> Result<()>;

    /// Authenticated GET of an object's media link
    async fn download(&self, media_link: &str) -> Result<MediaResponse>;
}

/// Error body returned by the JSON API
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// GCS JSON API client
#[derive(Debug, Clone)]
pub struct GcsStorageService {
    transport: AuthorizedTransport,
    endpoint: String,
}

impl GcsStorageService {
    pub fn new(transport: AuthorizedTransport, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            urlencoding::encode(bucket),
            urlencoding::encode(path)
        )
    }

    /// Map non-success statuses onto `StorageError`
    ///
    /// A 404 is `NotFound` only for requests addressing one object (`object` is
    /// `Some`); for bucket-level requests it stays a `Service` error.
    async fn check(object: Option<&str>, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let Some(path) = object.filter(|_| status == StatusCode::NOT_FOUND) {
            return Err(StorageError::NotFound {
                path: path.to_string(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        Err(StorageError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the media part
fn multipart_related(boundary: &str, metadata: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--", boundary).as_bytes());
    body
}

#[async_trait]
impl StorageService for GcsStorageService {
    async fn get_object(&self, bucket: &str, path: &str) -> Result<StorageObject> {
        let request = self.transport.http().get(self.object_url(bucket, path));
        let response = Self::check(Some(path), self.transport.send(request).await?).await?;

        let object = response.json::<StorageObject>().await?;
        debug!("Fetched metadata of '{}' from bucket '{}'", path, bucket);
        Ok(object)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_token: Option<&str>,
    ) -> Result<ObjectListing> {
        let url = format!(
            "{}/storage/v1/b/{}/o",
            self.endpoint,
            urlencoding::encode(bucket)
        );

        let mut query = vec![("prefix", prefix), ("delimiter", delimiter)];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let request = self.transport.http().get(url).query(&query);
        let response = Self::check(None, self.transport.send(request).await?).await?;

        Ok(response.json::<ObjectListing>().await?)
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StorageObject> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=multipart",
            self.endpoint,
            urlencoding::encode(bucket)
        );

        let boundary = format!("gcs-helper-{}", uuid::Uuid::new_v4().simple());
        let metadata = json!({ "name": name }).to_string();
        let body = multipart_related(&boundary, &metadata, content_type, &data);

        let request = self
            .transport
            .http()
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);
        let response = Self::check(None, self.transport.send(request).await?).await?;

        let object = response.json::<StorageObject>().await?;
        debug!(
            "Uploaded '{}' ({} bytes, {}) to bucket '{}'",
            name,
            data.len(),
            content_type,
            bucket
        );
        Ok(object)
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> Result<()> {
        let request = self.transport.http().delete(self.object_url(bucket, path));
        Self::check(Some(path), self.transport.send(request).await?).await?;

        debug!("Deleted '{}' from bucket '{}'", path, bucket);
        Ok(())
    }

    async fn download(&self, media_link: &str) -> Result<MediaResponse> {
        let request = self.transport.http().get(media_link);
        let response = Self::check(Some(media_link), self.transport.send(request).await?).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.bytes().await?;

        Ok(MediaResponse { content_type, body })
    }
}
