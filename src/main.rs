// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! VanLang Budget API Server
//!
//! Personal finance tracking (incomes, expenses, loans, investments,
//! budgets) with the VanLangBot assistant.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vanlang_budget::{
    background,
    config::{Config, StorageBackend},
    db::FirestoreDb,
    services::Mailer,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting VanLang Budget API"
    );

    let db = match config.storage_backend {
        StorageBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            FirestoreDb::new_in_memory()
        }
    };

    let mailer = Mailer::from_config(config.smtp.as_ref())?;
    if matches!(mailer, Mailer::Log) {
        tracing::warn!("SMTP_HOST not set; outgoing email is only logged");
    }

    let state = Arc::new(AppState::new(config.clone(), db).with_mailer(mailer));
    background::spawn_cache_sweeper(&state, background::CACHE_SWEEP_INTERVAL);
    background::spawn_savings_interest(&state, background::SAVINGS_INTEREST_INTERVAL);
    let app = vanlang_budget::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
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
                .add_directive("vanlang_budget=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
