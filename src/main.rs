use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use driveease::config::AppConfig;
use driveease::handlers;
use driveease::services::catalog::{CatalogService, CatalogSnapshot};
use driveease::state::AppState;
use driveease::store::postgrest::PostgrestStore;
use driveease::store::sqlite::SqliteStore;
use driveease::store::TableStore;

fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TableStore>> {
    match config.store_backend.as_str() {
        "sqlite" => {
            tracing::info!("using SQLite store (path: {})", config.database_url);
            Ok(Arc::new(SqliteStore::open(&config.database_url)?))
        }
        "supabase" => {
            anyhow::ensure!(!config.store_url.is_empty(), "STORE_URL must be set when STORE_BACKEND=supabase");
            anyhow::ensure!(!config.store_key.is_empty(), "STORE_KEY must be set when STORE_BACKEND=supabase");
            tracing::info!("using hosted store (url: {})", config.store_url);
            Ok(Arc::new(PostgrestStore::new(
                &config.store_url,
                config.store_key.clone(),
                config.store_timeout(),
            )?))
        }
        other => anyhow::bail!("unknown STORE_BACKEND: {other} (expected supabase or sqlite)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;
    let store = build_store(&config)?;

    store
        .verify_schema()
        .await
        .map_err(|e| anyhow::anyhow!("store schema check failed: {e}"))?;
    tracing::info!("store schema verified");

    let snapshot = match CatalogService::new(Arc::clone(&store)).load_snapshot().await {
        Ok(snapshot) => {
            tracing::info!(
                cars = snapshot.cars.len(),
                locations = snapshot.locations.len(),
                "catalog loaded"
            );
            snapshot
        }
        Err(e) => {
            tracing::warn!(error = %e, "initial catalog load failed, starting with an empty catalog");
            CatalogSnapshot::default()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), store, snapshot));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
