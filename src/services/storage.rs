//! Object storage for profile images.
//!
//! Bytes are stored as-is in a Supabase Storage bucket. Uploads are
//! validated before anything leaves the process, and a batch either lands
//! completely or not at all.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::profiles::ImageKind;
use crate::error::{ApiError, ApiResult};
use crate::validation::{extension_for, validate_image_content, validate_image_upload};

/// File received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub public_url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` at `path` and return its public URL
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Storage path of an object this backend handed out a URL for
    fn path_from_url(&self, url: &str) -> Option<String>;
}

/// Supabase Storage REST client
#[derive(Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(http: reqwest::Client, base_url: &str, service_key: &str, bucket: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String> {
        let response = self
            .http
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .timeout(Duration::from_secs(30))
            .body(data)
            .send()
            .await
            .context("Failed to reach storage service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Storage upload failed with status {}: {}", status, body);
        }

        tracing::debug!(path = path, "Object stored");
        Ok(self.public_url(path))
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .context("Failed to reach storage service")?;

        if !response.status().is_success() {
            anyhow::bail!("Storage delete failed with status {}", response.status());
        }
        Ok(())
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_url(""))
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }
}

/// Storage key for a new object: `<owner>/<kind>/<random>.<ext>`
pub fn object_path(owner_id: Uuid, kind: ImageKind, content_type: &str) -> String {
    let ext = extension_for(content_type).unwrap_or("bin");
    format!("{}/{}/{}.{}", owner_id, kind.as_str(), Uuid::new_v4(), ext)
}

/// Declared type and size, then the bytes themselves
fn validate_file(file: &UploadFile) -> ApiResult<()> {
    ApiError::check_upload(validate_image_upload(&file.content_type, file.data.len()))?;
    ApiError::check_upload(validate_image_content(&file.data, &file.content_type))
}

/// Validate and upload one image
pub async fn upload_image(
    storage: &dyn ObjectStorage,
    file: UploadFile,
    kind: ImageKind,
    owner_id: Uuid,
) -> ApiResult<StoredObject> {
    validate_file(&file)?;

    let path = object_path(owner_id, kind, &file.content_type);
    let public_url = storage
        .upload(&path, file.data, &file.content_type)
        .await
        .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;

    tracing::info!(owner_id = %owner_id, kind = kind.as_str(), path = %path, "Image uploaded");
    Ok(StoredObject { path, public_url })
}

/// Upload several images concurrently.
///
/// Every file is validated before the first byte is sent. If any upload
/// fails, the ones that succeeded are deleted again and the first failure
/// is returned.
pub async fn upload_batch(
    storage: &dyn ObjectStorage,
    files: Vec<UploadFile>,
    kind: ImageKind,
    owner_id: Uuid,
) -> ApiResult<Vec<StoredObject>> {
    for file in &files {
        validate_file(file)?;
    }

    let uploads = files.into_iter().map(|file| async move {
        let path = object_path(owner_id, kind, &file.content_type);
        storage
            .upload(&path, file.data, &file.content_type)
            .await
            .map(|public_url| StoredObject { path, public_url })
    });
    let results = join_all(uploads).await;

    let mut stored = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(object) => stored.push(object),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => tracing::warn!(error = %e, "Additional upload failure in batch"),
        }
    }

    let Some(error) = first_error else {
        tracing::info!(owner_id = %owner_id, count = stored.len(), "Image batch uploaded");
        return Ok(stored);
    };

    // Roll back the partial batch
    let cleanups = stored.iter().map(|object| storage.delete(&object.path));
    for (object, result) in stored.iter().zip(join_all(cleanups).await) {
        if let Err(e) = result {
            tracing::error!(path = %object.path, error = %e, "Failed to remove orphaned upload");
        }
    }
    tracing::warn!(owner_id = %owner_id, rolled_back = stored.len(), "Image batch failed");

    Err(ApiError::Storage(format!("{:#}", error)))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory storage that can be told to start failing
    #[derive(Default)]
    pub struct MemoryStorage {
        pub objects: Mutex<HashMap<String, Bytes>>,
        pub deleted: Mutex<Vec<String>>,
        pub fail_after: Mutex<Option<usize>>,
    }

    impl MemoryStorage {
        /// Fail every upload once `n` have succeeded
        pub fn failing_after(n: usize) -> Self {
            Self {
                fail_after: Mutex::new(Some(n)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        async fn upload(&self, path: &str, data: Bytes, _content_type: &str) -> Result<String> {
            let mut objects = self.objects.lock();
            if let Some(limit) = *self.fail_after.lock() {
                if objects.len() >= limit {
                    anyhow::bail!("bucket unavailable");
                }
            }
            objects.insert(path.to_string(), data);
            Ok(format!("https://cdn.test/{}", path))
        }

        async fn delete(&self, path: &str) -> Result<()> {
            self.objects.lock().remove(path);
            self.deleted.lock().push(path.to_string());
            Ok(())
        }

        fn path_from_url(&self, url: &str) -> Option<String> {
            url.strip_prefix("https://cdn.test/").map(str::to_string)
        }
    }
}
