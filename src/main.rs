// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rebound API Server
//!
//! Serves the feed, matchmaking, chat and ledger API plus the realtime
//! relay for chat rooms.

use std::sync::Arc;

use rebound::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, Store},
    services::{seed, ChatCompletionsClient, ContentService, TextGenerator},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Rebound API");

    let db: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_demo_data {
        seed::seed_demo_data(db.as_ref()).await?;
    }

    let generator: Arc<dyn TextGenerator> = Arc::new(ChatCompletionsClient::new(&config)?);
    if config.content_api_key.is_none() {
        tracing::warn!("CONTENT_API_KEY not set; generated copy will use fallbacks");
    } else {
        tracing::info!(model = %config.content_model, "Text generation configured");
    }
    let content = ContentService::new(generator);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, content));

    // Build router
    let app = rebound::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rebound=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
