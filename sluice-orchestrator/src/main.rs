use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

use config::{Config, StoreBackend};
use repository::{HttpElementRepository, InMemoryPipelineStore, PgPipelineStore, PipelineStore};
use service::reconfiguration::{ElementReconfigurationExecutor, ReconfigurationService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sluice Orchestrator...");

    let config = Config::from_env()?;
    config.validate()?;

    let store = build_store(&config).await?;

    let elements = HttpElementRepository::new(config.call_timeout)?;
    let executor = ElementReconfigurationExecutor::new(Arc::new(elements), config.call_timeout);
    let reconfiguration = ReconfigurationService::new(store.clone(), executor)
        .with_max_concurrent_calls(config.max_concurrent_calls);

    tracing::info!(
        "Element calls time out after {:?}, up to {} in flight per round",
        config.call_timeout,
        config.max_concurrent_calls
    );

    // Build router with all API endpoints
    let app = api::create_router(api::AppState::new(store, reconfiguration));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn PipelineStore>> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory pipeline store, state is lost on restart");
            Ok(Arc::new(InMemoryPipelineStore::new()))
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(&config.database_url)
                .await
                .context("Failed to create database pool")?;

            tracing::info!("Database connection pool created");

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok(Arc::new(PgPipelineStore::new(pool)))
        }
    }
}
