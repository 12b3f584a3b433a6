//! HTTP API for the disclosure game
//!
//! Participant routes drive a session through its runtime; admin routes read
//! the stored dataset.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::AppConfig;
use crate::db::Database;
use crate::runtime::{BackupSink, RuntimeManager};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, backup: Arc<dyn BackupSink>, config: AppConfig) -> Self {
        Self {
            runtime: Arc::new(RuntimeManager::new(db, backup)),
            config: Arc::new(config),
        }
    }
}
