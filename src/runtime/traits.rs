//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Database, TurnRow};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage for finished sessions
#[async_trait]
pub trait TurnSink: Send + Sync {
    /// Append all rows of one session, atomically
    async fn append_rows(&self, rows: &[TurnRow]) -> Result<usize, String>;

    /// Render the whole dataset as CSV
    async fn export_csv(&self) -> Result<String, String>;
}

/// Off-site copy of the dataset
#[async_trait]
pub trait BackupSink: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Replace the remote copy with `csv`
    async fn upload(&self, csv: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TurnSink + ?Sized> TurnSink for Arc<T> {
    async fn append_rows(&self, rows: &[TurnRow]) -> Result<usize, String> {
        (**self).append_rows(rows).await
    }

    async fn export_csv(&self) -> Result<String, String> {
        (**self).export_csv().await
    }
}

#[async_trait]
impl<T: BackupSink + ?Sized> BackupSink for Arc<T> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    async fn upload(&self, csv: &str) -> Result<(), String> {
        (**self).upload(csv).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as a `TurnSink`
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl TurnSink for DatabaseStorage {
    async fn append_rows(&self, rows: &[TurnRow]) -> Result<usize, String> {
        self.db.append_rows(rows).map_err(|e| e.to_string())
    }

    async fn export_csv(&self) -> Result<String, String> {
        self.db.export_csv().map_err(|e| e.to_string())
    }
}

/// Sink used when no remote backup is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackup;

#[async_trait]
impl BackupSink for NoBackup {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn upload(&self, _csv: &str) -> Result<(), String> {
        Ok(())
    }
}
