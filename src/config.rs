//! Runtime configuration from environment (optionally a `.env` file).

use std::time::Duration;

/// Which row backend the client talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Postgres,
    Memory,
}

/// Which object store uploads go to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageKind {
    S3,
    Memory,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// Schema holding the application tables. Must be a valid PostgreSQL identifier.
    pub schema: String,
    pub backend: BackendKind,
    pub storage: StorageKind,
    pub bind_addr: String,
    /// Base for public object URLs (e.g. a CDN in front of the bucket). Falls back to the S3 endpoint.
    pub public_base_url: Option<String>,
    pub signed_url_ttl: Duration,
    /// Zero means a cached query is reused until a mutation or realtime event invalidates it.
    pub cache_stale_after: Duration,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "postgres://localhost/daycare".into(),
            schema: "public".into(),
            backend: BackendKind::Postgres,
            storage: StorageKind::S3,
            bind_addr: "0.0.0.0:3000".into(),
            public_base_url: None,
            signed_url_ttl: Duration::from_secs(3600),
            cache_stale_after: Duration::ZERO,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Read `DATABASE_URL`, `DAYCARE_SCHEMA`, `DAYCARE_BACKEND`, `STORAGE_BACKEND`, `BIND_ADDR`,
    /// `S3_PUBLIC_BASE_URL`, `SIGNED_URL_TTL_SECS`, `CACHE_STALE_SECS`, `MAX_UPLOAD_BYTES`.
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = AppConfig::default();
        AppConfig {
            database_url: env_or("DATABASE_URL", defaults.database_url),
            schema: env_or("DAYCARE_SCHEMA", defaults.schema),
            backend: match std::env::var("DAYCARE_BACKEND").ok().as_deref() {
                Some(s) if s.eq_ignore_ascii_case("memory") => BackendKind::Memory,
                _ => defaults.backend,
            },
            storage: match std::env::var("STORAGE_BACKEND").ok().as_deref() {
                Some(s) if s.eq_ignore_ascii_case("memory") => StorageKind::Memory,
                _ => defaults.storage,
            },
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok().filter(|s| !s.is_empty()),
            signed_url_ttl: env_parse("SIGNED_URL_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.signed_url_ttl),
            cache_stale_after: env_parse("CACHE_STALE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_stale_after),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES")
                .map(|n| n as usize)
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or(default)
}

fn env_parse(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
