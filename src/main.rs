use std::sync::Arc;

use url::Url;

use surat_api::database::memory::MemStore;
use surat_api::database::postgres::PgStore;
use surat_api::database::store::Store;
use surat_api::handlers::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = surat_api::config::config();
    tracing::info!("starting surat-api in {:?} mode", config.environment);

    let store = build_store().await?;
    let app = app(AppState::new(store));

    let port = std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(3000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Connect to Postgres when DATABASE_URL is set; otherwise run on the
/// in-memory store, which is enough for demos and local exploration.
async fn build_store() -> anyhow::Result<Arc<dyn Store>> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let parsed = Url::parse(&database_url)?;
            tracing::info!("connecting to {}", parsed.host_str().unwrap_or("postgres"));
            let store = PgStore::connect(&database_url)
                .await
                .map_err(|e| anyhow::anyhow!("failed to connect to database: {}", e))?;
            Ok(Arc::new(store))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Ok(Arc::new(MemStore::new()))
        }
    }
}
