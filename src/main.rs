//! Disclosure Game - a six-turn self-disclosure study
//!
//! Participants chat with a scripted partner whose openness depends on a
//! randomly assigned condition. Finished sessions are stored in SQLite and
//! optionally mirrored to GitHub.

mod api;
mod backup;
mod config;
mod db;
mod partner;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use backup::GithubBackup;
use config::AppConfig;
use db::Database;
use runtime::{BackupSink, NoBackup};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disclosure_game=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    let summary = db.summary()?;
    tracing::info!(rows = summary.rows, sessions = summary.sessions, "Dataset loaded");

    let backup: Arc<dyn BackupSink> = match &config.backup {
        Some(backup_config) => {
            tracing::info!(
                repo = %backup_config.repo,
                path = %backup_config.path,
                branch = %backup_config.branch,
                "GitHub backup enabled"
            );
            Arc::new(GithubBackup::new(backup_config.clone())?)
        }
        None => {
            tracing::info!("GitHub backup disabled. Set GITHUB_BACKUP_TOKEN and GITHUB_BACKUP_REPO to enable.");
            Arc::new(NoBackup)
        }
    };

    if config.admin_key.is_none() {
        tracing::warn!("ADMIN_KEY not set; admin routes are disabled");
    }
    if config.expose_condition {
        tracing::warn!("EXPOSE_CONDITION is on; participants can see their condition");
    }

    let port = config.port;
    let state = AppState::new(db, backup, config);
    state.runtime.start_idle_sweeper(runtime::SWEEP_INTERVAL);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Disclosure game server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
