use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use school_office_api::config::{config, StorageBackend};
use school_office_api::database::{
    DatabaseManager, EntityMetadata, MemoryRepository, PgCatalog, PgRepository, Repository, StaticSchema,
};
use school_office_api::handlers::{router, AppState};
use school_office_api::is_production;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "school_office_api=info,tower_http=info".into()),
        )
        .init();

    let config = config();
    info!("Starting School Office API in {:?} mode", config.environment);

    let (store, metadata): (Arc<dyn Repository>, Arc<dyn EntityMetadata>) = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("connecting to Postgres")?;
            (Arc::new(PgRepository::new(pool.clone())), Arc::new(PgCatalog::new(pool)))
        }
        StorageBackend::Memory => {
            if is_production!() {
                warn!("Using the in-memory store in production; nothing survives a restart");
            }
            info!("Using the in-memory store");
            (Arc::new(MemoryRepository::new()), Arc::new(StaticSchema::new()))
        }
    };

    let state = AppState::new(store, metadata);
    if config.soft_delete.warm_on_startup {
        let schema = StaticSchema::new();
        state.registry.warm(schema.entity_names()).await;
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("School Office API listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await.context("server terminated")?;
    Ok(())
}
