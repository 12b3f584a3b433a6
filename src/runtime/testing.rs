//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::db::TurnRow;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// Mock Turn Sink
// ============================================================================

/// In-memory sink that can be switched into a failing mode
#[derive(Default)]
pub struct InMemorySink {
    rows: Mutex<Vec<TurnRow>>,
    fail: AtomicBool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<TurnRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl TurnSink for InMemorySink {
    async fn append_rows(&self, rows: &[TurnRow]) -> Result<usize, String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("disk full".to_string());
        }
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn export_csv(&self) -> Result<String, String> {
        let rows = self.rows.lock().unwrap();
        Ok(format!("rows={}", rows.len()))
    }
}

// ============================================================================
// Mock Backup
// ============================================================================

/// Backup sink that records every upload
pub struct RecordingBackup {
    enabled: bool,
    fail: bool,
    pub uploads: Mutex<Vec<String>>,
}

impl RecordingBackup {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::enabled()
        }
    }

    pub fn recorded_uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackupSink for RecordingBackup {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn upload(&self, csv: &str) -> Result<(), String> {
        self.uploads.lock().unwrap().push(csv.to_string());
        if self.fail {
            Err("remote unavailable".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

mod tests {
    use super::*;
    use crate::db::Database;
    use crate::partner::{DisclosureDepth, TOTAL_TURNS};
    use crate::runtime::{
        RuntimeError, RuntimeManager, SessionRuntime, FINISHED_IDLE_TTL, IDLE_TTL, SWEEP_INTERVAL,
    };
    use crate::state_machine::{Ratings, SessionState, TransitionError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use std::time::Duration;

    type TestRuntime = SessionRuntime<Arc<InMemorySink>, Arc<RecordingBackup>, StdRng>;

    fn runtime(sink: &Arc<InMemorySink>, backup: &Arc<RecordingBackup>) -> TestRuntime {
        SessionRuntime::new(
            "test-session",
            sink.clone(),
            backup.clone(),
            StdRng::seed_from_u64(7),
        )
    }

    fn ratings() -> Ratings {
        Ratings {
            trust: 6,
            closeness: 5,
            comfort: 6,
            warmth: 7,
            perceived_openness: 4,
            reciprocity_rating: 5,
            enjoyment: 6,
            strategy_adjustment: 3,
            strategy_text: "Opened up once they did".to_string(),
        }
    }

    async fn play_all_turns(rt: &mut TestRuntime) {
        rt.start("ab1234").await.unwrap();
        for _ in 0..TOTAL_TURNS {
            rt.submit_turn(DisclosureDepth::MildlyPersonal).await.unwrap();
        }
        assert!(matches!(rt.state(), SessionState::Finished { .. }));
    }

    #[tokio::test]
    async fn test_in_memory_sink() {
        let sink = InMemorySink::new();
        assert_eq!(sink.append_rows(&[]).await.unwrap(), 0);
        sink.set_failing(true);
        assert!(sink.append_rows(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_full_session_saves_six_rows_and_resets() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::enabled());
        let mut rt = runtime(&sink, &backup);

        play_all_turns(&mut rt).await;
        let condition = rt.state().session().unwrap().condition;

        rt.submit_ratings(ratings()).await.unwrap();

        assert_eq!(*rt.state(), SessionState::Uninitialized);
        let rows = sink.rows();
        assert_eq!(rows.len(), TOTAL_TURNS as usize);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.turn as usize, i + 1);
            assert_eq!(row.participant_id, "ab1234");
            assert_eq!(row.timing, condition.timing);
            assert_eq!(row.reciprocity, condition.reciprocity);
            assert_eq!(row.ratings, ratings());
            assert_eq!(row.timestamp, rows[0].timestamp);
        }
        assert_eq!(backup.recorded_uploads(), vec!["rows=6".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_session_resumable() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::enabled());
        let mut rt = runtime(&sink, &backup);
        play_all_turns(&mut rt).await;
        let before = rt.state().session().unwrap().clone();

        sink.set_failing(true);
        let err = rt.submit_ratings(ratings()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Persistence(ref m) if m == "disk full"));

        let SessionState::Finished { session } = rt.state() else {
            panic!("Expected Finished, got {:?}", rt.state());
        };
        assert_eq!(*session, before);
        assert!(sink.rows().is_empty());
        assert!(backup.recorded_uploads().is_empty());

        sink.set_failing(false);
        rt.submit_ratings(ratings()).await.unwrap();
        assert_eq!(sink.rows().len(), TOTAL_TURNS as usize);
        assert_eq!(*rt.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_backup_failure_does_not_affect_session() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::failing());
        let mut rt = runtime(&sink, &backup);
        play_all_turns(&mut rt).await;

        rt.submit_ratings(ratings()).await.unwrap();

        assert_eq!(*rt.state(), SessionState::Uninitialized);
        assert_eq!(backup.recorded_uploads().len(), 1);
        assert_eq!(sink.rows().len(), TOTAL_TURNS as usize);
    }

    #[tokio::test]
    async fn test_disabled_backup_is_skipped() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::disabled());
        let mut rt = runtime(&sink, &backup);
        play_all_turns(&mut rt).await;

        rt.submit_ratings(ratings()).await.unwrap();
        assert!(backup.recorded_uploads().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_events_leave_state_untouched() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::enabled());
        let mut rt = runtime(&sink, &backup);

        let err = rt.submit_turn(DisclosureDepth::Surface).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transition(TransitionError::InvalidState(_))
        ));
        assert_eq!(*rt.state(), SessionState::Uninitialized);

        let err = rt.start("   ").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transition(TransitionError::InvalidInput(_))
        ));

        rt.start("ab1234").await.unwrap();
        let err = rt.submit_ratings(ratings()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Transition(_)));
        assert!(matches!(rt.state(), SessionState::Active { .. }));
        assert!(sink.rows().is_empty());
    }

    #[tokio::test]
    async fn test_reset_abandons_without_writing() {
        let sink = Arc::new(InMemorySink::new());
        let backup = Arc::new(RecordingBackup::enabled());
        let mut rt = runtime(&sink, &backup);

        rt.start("ab1234").await.unwrap();
        rt.submit_turn(DisclosureDepth::Vulnerable).await.unwrap();
        rt.reset().await.unwrap();

        assert_eq!(*rt.state(), SessionState::Uninitialized);
        assert!(sink.rows().is_empty());
    }

    #[tokio::test]
    async fn test_manager_create_get_release() {
        let db = Database::open_in_memory().unwrap();
        let manager = RuntimeManager::new(db, Arc::new(NoBackup));

        let (id, handle) = manager.create().await;
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(manager.active_count().await, 1);

        handle.lock().await.start("ab1234").await.unwrap();
        let fetched = manager.get(&id).await.unwrap();
        assert!(matches!(
            fetched.lock().await.state(),
            SessionState::Active { .. }
        ));

        assert!(manager.release(&id).await);
        assert!(!manager.release(&id).await);
        assert!(manager.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_manager_session_writes_to_database() {
        let db = Database::open_in_memory().unwrap();
        let manager = RuntimeManager::new(db.clone(), Arc::new(NoBackup));
        let (_, handle) = manager.create().await;

        let mut rt = handle.lock().await;
        rt.start("cd5678").await.unwrap();
        for _ in 0..TOTAL_TURNS {
            rt.submit_turn(DisclosureDepth::Surface).await.unwrap();
        }
        rt.submit_ratings(ratings()).await.unwrap();

        assert_eq!(db.count_rows().unwrap(), i64::from(TOTAL_TURNS));
        assert_eq!(db.count_sessions().unwrap(), 1);
    }

    fn manager() -> Arc<RuntimeManager> {
        let db = Database::open_in_memory().unwrap();
        Arc::new(RuntimeManager::new(db, Arc::new(NoBackup)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_sessions_are_evicted() {
        let manager = manager();
        for _ in 0..1000 {
            let (_, handle) = manager.create().await;
            handle.lock().await.start("ab1234").await.unwrap();
        }
        assert_eq!(manager.active_count().await, 1000);

        tokio::time::advance(IDLE_TTL - Duration::from_secs(1)).await;
        assert_eq!(manager.evict_idle().await, 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(manager.evict_idle().await, 1000);
        assert_eq!(manager.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_eviction() {
        let manager = manager();
        let (id, handle) = manager.create().await;
        handle.lock().await.start("ab1234").await.unwrap();

        tokio::time::advance(IDLE_TTL - Duration::from_secs(60)).await;
        assert!(manager.get(&id).await.is_some());
        tokio::time::advance(Duration::from_secs(120)).await;

        assert_eq!(manager.evict_idle().await, 0);
        assert!(manager.get(&id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_session_waits_longer_for_ratings() {
        let manager = manager();
        let (finished_id, handle) = manager.create().await;
        {
            let mut rt = handle.lock().await;
            rt.start("ab1234").await.unwrap();
            for _ in 0..TOTAL_TURNS {
                rt.submit_turn(DisclosureDepth::Surface).await.unwrap();
            }
            assert!(matches!(rt.state(), SessionState::Finished { .. }));
        }
        let (active_id, handle) = manager.create().await;
        handle.lock().await.start("cd5678").await.unwrap();

        tokio::time::advance(IDLE_TTL + Duration::from_secs(1)).await;
        assert_eq!(manager.evict_idle().await, 1);
        assert!(manager.get(&active_id).await.is_none());

        // The lookup above did not touch the finished session
        tokio::time::advance(FINISHED_IDLE_TTL).await;
        assert_eq!(manager.evict_idle().await, 1);
        assert!(manager.get(&finished_id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_session_is_kept() {
        let manager = manager();
        let (id, handle) = manager.create().await;
        let guard = handle.lock().await;

        tokio::time::advance(IDLE_TTL * 2).await;
        assert_eq!(manager.evict_idle().await, 0);
        assert_eq!(manager.active_count().await, 1);
        drop(guard);
        assert!(manager.release(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let manager = manager();
        manager.create().await;
        let sweeper = manager.start_idle_sweeper(SWEEP_INTERVAL);

        tokio::time::sleep(IDLE_TTL + SWEEP_INTERVAL * 2).await;
        tokio::task::yield_now().await;

        assert_eq!(manager.active_count().await, 0);
        sweeper.abort();
    }
}
