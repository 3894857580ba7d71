//! Object descriptors as returned by the GCS JSON API
//!
//! refer to https://cloud.google.com/storage/docs/json_api/v1/objects for details

use serde::{Deserialize, Deserializer, Serialize};

/// Metadata of one stored object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageObject {
    /// Full object name (path) inside the bucket
    pub name: String,
    pub bucket: String,
    /// Size in bytes (GCS encodes it as a decimal string)
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,
    /// Direct download URL for the object content
    pub media_link: String,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub md5_hash: Option<String>,
    pub generation: Option<String>,
    pub updated: Option<String>,
}

/// Response of an objects.list call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectListing {
    /// Common prefixes ("directories") folded by the delimiter
    pub prefixes: Vec<String>,
    pub items: Vec<StorageObject>,
    /// Present when more pages are available
    pub next_page_token: Option<String>,
}

/// Raw content fetched from an object's media link
#[derive(Debug, Clone)]
pub struct MediaResponse {
    pub content_type: Option<String>,
    pub body: bytes::Bytes,
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
    }
}
