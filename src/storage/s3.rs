//! S3-compatible object store.

use super::Storage;
use crate::error::AppError;
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    /// Public object URLs are `<base>/<bucket>/<path>`; `None` uses the virtual-hosted S3 URL.
    public_base_url: Option<String>,
}

impl S3Storage {
    pub fn new(client: Client, public_base_url: Option<String>) -> Self {
        S3Storage {
            client,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    /// Client from the standard AWS environment (credentials, region, endpoint).
    pub async fn from_env(public_base_url: Option<String>) -> Self {
        let conf = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&conf), public_base_url)
    }
}

fn storage_err(e: impl std::fmt::Display) -> AppError {
    AppError::Storage(e.to_string())
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(storage_err)?;
        tracing::info!(bucket = %bucket, path = %path, size, "object uploaded");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}/{}", base, bucket, path),
            None => format!("https://{}.s3.amazonaws.com/{}", bucket, path),
        }
    }

    async fn signed_url(&self, bucket: &str, path: &str, ttl: Duration) -> Result<String, AppError> {
        let cfg = PresigningConfig::expires_in(ttl).map_err(storage_err)?;
        let req = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .presigned(cfg)
            .await
            .map_err(storage_err)?;
        Ok(req.uri().to_string())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), AppError> {
        for p in paths {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(p)
                .send()
                .await
                .map_err(storage_err)?;
        }
        Ok(())
    }
}
