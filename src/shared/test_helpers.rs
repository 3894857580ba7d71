use crate::modules::storage::{
    MediaResponse, ObjectListing, StorageError, StorageObject, StorageService,
};

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const MEDIA_SCHEME: &str = "memory://";

#[derive(Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
}

/// In-memory `StorageService` that counts round trips
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<BTreeMap<(String, String), StoredBlob>>,
    failures: Mutex<HashMap<(String, String), u16>>,
    page_size: Option<usize>,
    metadata_calls: AtomicUsize,
    downloads: AtomicUsize,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listings return at most `page_size` items per page
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn put(&self, bucket: &str, name: &str, data: &[u8], content_type: &str) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), name.to_string()),
            StoredBlob {
                data: Bytes::copy_from_slice(data),
                content_type: content_type.to_string(),
            },
        );
    }

    /// Make metadata lookups of this object fail with `status`
    pub fn fail_with(&self, bucket: &str, name: &str, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert((bucket.to_string(), name.to_string()), status);
    }

    pub fn contains(&self, bucket: &str, name: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), name.to_string()))
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn descriptor(bucket: &str, name: &str, blob: &StoredBlob) -> StorageObject {
        StorageObject {
            name: name.to_string(),
            bucket: bucket.to_string(),
            size: blob.data.len() as u64,
            media_link: format!("{}{}/{}", MEDIA_SCHEME, bucket, name),
            content_type: Some(blob.content_type.clone()),
            ..Default::default()
        }
    }

    fn not_found(path: &str) -> StorageError {
        StorageError::NotFound {
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn get_object(&self, bucket: &str, path: &str) -> Result<StorageObject, StorageError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        let key = (bucket.to_string(), path.to_string());
        if let Some(status) = self.failures.lock().unwrap().get(&key) {
            return Err(StorageError::Service {
                status: *status,
                message: format!("Forced failure for {}", path),
            });
        }

        self.objects
            .lock()
            .unwrap()
            .get(&key)
            .map(|blob| Self::descriptor(bucket, path, blob))
            .ok_or_else(|| Self::not_found(path))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        page_token: Option<&str>,
    ) -> Result<ObjectListing, StorageError> {
        let objects = self.objects.lock().unwrap();

        let mut prefixes = BTreeSet::new();
        let mut items = Vec::new();
        for ((b, name), blob) in objects.iter() {
            if b != bucket || !name.starts_with(prefix) {
                continue;
            }
            let rest = &name[prefix.len()..];
            match rest.find(delimiter) {
                Some(idx) if !delimiter.is_empty() => {
                    prefixes.insert(format!("{}{}", prefix, &rest[..idx + delimiter.len()]));
                }
                _ => items.push(Self::descriptor(bucket, name, blob)),
            }
        }

        let offset: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let (items, next_page_token) = match self.page_size {
            Some(size) if offset + size < items.len() => (
                items[offset..offset + size].to_vec(),
                Some((offset + size).to_string()),
            ),
            Some(_) => (items[offset.min(items.len())..].to_vec(), None),
            None => (items, None),
        };

        Ok(ObjectListing {
            prefixes: if offset == 0 {
                prefixes.into_iter().collect()
            } else {
                Vec::new()
            },
            items,
            next_page_token,
        })
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StorageObject, StorageError> {
        let blob = StoredBlob {
            data,
            content_type: content_type.to_string(),
        };
        let object = Self::descriptor(bucket, name, &blob);
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), name.to_string()), blob);
        Ok(object)
    }

    async fn delete_object(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), path.to_string()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(path))
    }

    async fn download(&self, media_link: &str) -> Result<MediaResponse, StorageError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        let (bucket, name) = media_link
            .strip_prefix(MEDIA_SCHEME)
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(|| Self::not_found(media_link))?;

        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), name.to_string()))
            .map(|blob| MediaResponse {
                content_type: Some(blob.content_type.clone()),
                body: blob.data.clone(),
            })
            .ok_or_else(|| Self::not_found(media_link))
    }
}
