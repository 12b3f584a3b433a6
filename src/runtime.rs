//! Runtime for executing sessions
//!
//! Each browser session gets its own runtime behind its own mutex, so
//! requests for one session are serialized and sessions never share state.
//! Sessions a participant walks away from are evicted once idle.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{RuntimeError, SessionRuntime};
pub use traits::*;

use crate::db::Database;
use crate::state_machine::SessionState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Idle time after which an unstarted or in-progress session is dropped
pub const IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);
/// Idle time allowed for a finished session waiting on (a retry of) its ratings
pub const FINISHED_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// How often the background sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = SessionRuntime<DatabaseStorage, Arc<dyn BackupSink>, StdRng>;

/// Shared handle to one session's runtime
pub type SessionHandle = Arc<Mutex<ProductionRuntime>>;

struct TrackedRuntime {
    handle: SessionHandle,
    last_active: Instant,
}

/// Manager for all session runtimes
pub struct RuntimeManager {
    storage: DatabaseStorage,
    backup: Arc<dyn BackupSink>,
    runtimes: RwLock<HashMap<String, TrackedRuntime>>,
}

impl RuntimeManager {
    pub fn new(db: Database, backup: Arc<dyn BackupSink>) -> Self {
        Self {
            storage: DatabaseStorage::new(db),
            backup,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a fresh runtime under a new session id
    pub async fn create(&self) -> (String, SessionHandle) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let runtime: ProductionRuntime = SessionRuntime::new(
            session_id.clone(),
            self.storage.clone(),
            self.backup.clone(),
            StdRng::from_entropy(),
        );
        let handle = Arc::new(Mutex::new(runtime));

        self.runtimes.write().await.insert(
            session_id.clone(),
            TrackedRuntime {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::debug!(session_id = %session_id, "Runtime created");

        (session_id, handle)
    }

    /// Look up a runtime and mark it active
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let mut runtimes = self.runtimes.write().await;
        let tracked = runtimes.get_mut(session_id)?;
        tracked.last_active = Instant::now();
        Some(tracked.handle.clone())
    }

    /// Drop a runtime; returns false if it was not registered
    pub async fn release(&self, session_id: &str) -> bool {
        let removed = self.runtimes.write().await.remove(session_id).is_some();
        if removed {
            tracing::debug!(session_id = %session_id, "Runtime released");
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.runtimes.read().await.len()
    }

    /// Remove runtimes idle past their TTL. Runtimes that are locked by a
    /// request or mid-save are always kept.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut runtimes = self.runtimes.write().await;
        let before = runtimes.len();

        runtimes.retain(|session_id, tracked| {
            let Ok(runtime) = tracked.handle.try_lock() else {
                return true;
            };
            let ttl = match runtime.state() {
                SessionState::Saving { .. } => return true,
                SessionState::Finished { .. } => FINISHED_IDLE_TTL,
                SessionState::Uninitialized | SessionState::Active { .. } => IDLE_TTL,
            };
            let keep = now.duration_since(tracked.last_active) < ttl;
            if !keep {
                tracing::info!(
                    session_id = %session_id,
                    state = runtime.state().name(),
                    "Evicting idle session"
                );
            }
            keep
        });

        before - runtimes.len()
    }

    /// Run `evict_idle` every `every` until the manager is dropped
    pub fn start_idle_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Idle sessions evicted");
                }
            }
            tracing::debug!("Idle sweeper stopped");
        })
    }

    /// Get the database handle
    pub fn db(&self) -> &Database {
        self.storage.inner()
    }
}
