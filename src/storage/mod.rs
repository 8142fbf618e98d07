//! Object storage for uploaded files (documents, activity photos).

mod memory;
mod s3;

pub use memory::{MemoryStorage, StoredObject};
pub use s3::S3Storage;

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Private bucket; objects are served through signed URLs.
pub const DOCUMENTS_BUCKET: &str = "documents";
/// Public bucket for activity photos.
pub const ACTIVITY_PHOTOS_BUCKET: &str = "activity-photos";

/// A file handed to an upload operation.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        FileUpload {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lowercased extension of the original file name, `bin` when there is none.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// Object key `<entity_id>/<unix_millis>.<ext>`.
pub fn object_path(entity_id: &uuid::Uuid, file: &FileUpload, at: DateTime<Utc>) -> String {
    format!("{}/{}.{}", entity_id, at.timestamp_millis(), file.extension())
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `bytes` under `bucket/path`, replacing any existing object.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Time-limited URL for a private object.
    async fn signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String, AppError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), AppError>;
}
