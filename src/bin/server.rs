//! daycare-server: REST API for the childcare center.
//!
//! `DAYCARE_BACKEND=memory STORAGE_BACKEND=memory cargo run --bin daycare-server` runs without
//! PostgreSQL or S3.

use daycare_sdk::{
    app, ensure_database_exists, ensure_tables, spawn_pg_bridge, AppConfig, AppState, Backend, BackendKind,
    CareClient, MemoryBackend, MemoryStorage, PgBackend, QueryCache, Realtime, S3Storage, Storage, StorageKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("daycare_sdk=info,daycare_server=info,tower_http=info")),
        )
        .init();

    let realtime = Realtime::new();
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&config.database_url)
                .await?;
            ensure_tables(&pool, &config.schema).await?;
            spawn_pg_bridge(pool.clone(), realtime.clone());
            tracing::info!(schema = %config.schema, "using PostgreSQL backend");
            Arc::new(PgBackend::new(pool, config.schema.clone()))
        }
        BackendKind::Memory => {
            tracing::info!("using in-memory backend; data is lost on exit");
            Arc::new(MemoryBackend::with_realtime(realtime.clone()))
        }
    };
    let storage: Arc<dyn Storage> = match config.storage {
        StorageKind::S3 => Arc::new(S3Storage::from_env(config.public_base_url.clone()).await),
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
    };

    let client = CareClient::new(backend, storage, realtime)
        .with_cache(QueryCache::new(config.cache_stale_after))
        .with_signed_url_ttl(config.signed_url_ttl);
    let state = AppState::new(client, config.clone());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("daycare-server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
