pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::LayoutCache;
use crate::config::Config;
use crate::database::Database;
use crate::services::booking::BookingEngine;
use crate::store::IdentityProvider;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub identity: Arc<dyn IdentityProvider>,
    pub cache: Option<LayoutCache>,
    pub config: Config,
}

impl AppState {
    /// Production wiring: PostgreSQL stores, optional Redis layout cache and a
    /// background warmup of all active show inventories.
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let db = Database::connect(&config.database).await?;
        db.run_migrations().await?;

        let engine = Arc::new(BookingEngine::new(
            Arc::new(db.catalog()),
            Arc::new(db.booking_store()),
            config.booking.clone(),
        ));

        let cache = if config.features.enable_layout_cache {
            match LayoutCache::connect(&config.redis.url, config.redis.layout_ttl_seconds).await {
                Ok(cache) => {
                    tracing::info!("Redis connected");
                    Some(cache)
                }
                Err(e) => {
                    tracing::warn!("Redis unavailable, serving seat layouts without cache: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let state = Self::from_parts(engine, Arc::new(db.identity()), cache, config);

        let state_for_bg = state.clone();
        task::spawn(async move {
            // Поднимаем инвентари активных сеансов в фоне
            if let Err(e) = state_for_bg.engine.warmup().await {
                tracing::error!("Inventory warmup failed: {}", e);
            }
        });

        Ok(state)
    }

    pub fn from_parts(
        engine: Arc<BookingEngine>,
        identity: Arc<dyn IdentityProvider>,
        cache: Option<LayoutCache>,
        config: Config,
    ) -> Arc<Self> {
        Arc::new(Self { engine, identity, cache, config })
    }
}

/// HTTP router with all routes mounted under `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
