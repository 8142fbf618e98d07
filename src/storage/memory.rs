//! In-process object store.

use super::Storage;
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .ok()?
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| AppError::Storage("memory storage lock poisoned".into()))?;
        objects.insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }

    async fn signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String, AppError> {
        if self.get(bucket, path).is_none() {
            return Err(AppError::Storage(format!("object not found: {}/{}", bucket, path)));
        }
        let expires = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!(
            "memory://{}/{}?token={}&expires={}",
            bucket,
            path,
            uuid::Uuid::new_v4().simple(),
            expires
        ))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), AppError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| AppError::Storage("memory storage lock poisoned".into()))?;
        for p in paths {
            objects.remove(&(bucket.to_string(), p.clone()));
        }
        Ok(())
    }
}
