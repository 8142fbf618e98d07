//! Daycare SDK: data access, query cache, realtime notifications and uploads for a
//! childcare center, plus the REST router that exposes them.

pub mod auth;
pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod realtime;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod storage;
pub mod store;

pub use auth::{AuthContext, AuthResult, AuthService, Session};
pub use backend::{Backend, Filter, MemoryBackend, PgBackend, Query, Row};
pub use cache::{QueryCache, QueryKey};
pub use client::CareClient;
pub use config::{AppConfig, BackendKind, StorageKind};
pub use error::AppError;
pub use realtime::{spawn_pg_bridge, ChangeEvent, ChangeKind, Realtime, RealtimeChannel};
pub use response::{success_many, success_one, success_one_ok};
pub use routes::{api_routes, app, common_routes};
pub use state::AppState;
pub use storage::{FileUpload, MemoryStorage, S3Storage, Storage};
pub use store::{ensure_database_exists, ensure_tables};
