//! Session runtime executor

use super::traits::{BackupSink, TurnSink};

use crate::partner::DisclosureDepth;
use crate::state_machine::{transition, Effect, Event, Ratings, SessionState, TransitionError};
use chrono::Utc;
use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Failed to save session: {0}")]
    Persistence(String),
}

/// Generic session runtime that can work with any storage, backup and RNG
pub struct SessionRuntime<S, B, R>
where
    S: TurnSink,
    B: BackupSink,
    R: Rng + Send,
{
    session_id: String,
    state: SessionState,
    storage: S,
    backup: B,
    rng: R,
}

impl<S, B, R> SessionRuntime<S, B, R>
where
    S: TurnSink,
    B: BackupSink,
    R: Rng + Send,
{
    pub fn new(session_id: impl Into<String>, storage: S, backup: B, rng: R) -> Self {
        Self {
            session_id: session_id.into(),
            state: SessionState::Uninitialized,
            storage,
            backup,
            rng,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub async fn start(&mut self, participant_id: impl Into<String>) -> Result<(), RuntimeError> {
        self.apply(Event::Start {
            participant_id: participant_id.into(),
        })
        .await
    }

    pub async fn submit_turn(&mut self, depth: DisclosureDepth) -> Result<(), RuntimeError> {
        self.apply(Event::SubmitTurn { depth }).await
    }

    pub async fn submit_ratings(&mut self, ratings: Ratings) -> Result<(), RuntimeError> {
        self.apply(Event::SubmitRatings {
            ratings,
            submitted_at: Utc::now(),
        })
        .await
    }

    pub async fn reset(&mut self) -> Result<(), RuntimeError> {
        self.apply(Event::Reset).await
    }

    /// Feed an event through the state machine and run the resulting effects.
    ///
    /// Effects may generate follow-up events; these are queued and processed
    /// in order, without recursion.
    pub async fn apply(&mut self, event: Event) -> Result<(), RuntimeError> {
        let mut events = VecDeque::from([event]);
        let mut failure = None;

        while let Some(current) = events.pop_front() {
            if let Event::PersistFailed { message } = &current {
                failure = Some(message.clone());
            }

            let result = match transition(&self.state, current, &mut self.rng) {
                Ok(r) => r,
                Err(e) => {
                    if let TransitionError::Configuration(msg) = &e {
                        tracing::error!(session_id = %self.session_id, error = %msg, "Message pool misconfigured");
                    } else {
                        tracing::debug!(session_id = %self.session_id, error = %e, "Rejected event");
                    }
                    return Err(e.into());
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::info!(
                    session_id = %self.session_id,
                    from = old_state.name(),
                    to = self.state.name(),
                    "State change"
                );
            }

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect).await {
                    events.push_back(generated);
                }
            }
        }

        match failure {
            Some(message) => Err(RuntimeError::Persistence(message)),
            None => Ok(()),
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::PersistSession { rows } => match self.storage.append_rows(&rows).await {
                Ok(count) => {
                    tracing::info!(session_id = %self.session_id, rows = count, "Session saved");
                    Some(Event::PersistSucceeded)
                }
                Err(message) => {
                    tracing::error!(session_id = %self.session_id, error = %message, "Failed to save session");
                    Some(Event::PersistFailed { message })
                }
            },

            Effect::BackupDataset => {
                self.backup_dataset().await;
                None
            }
        }
    }

    async fn backup_dataset(&self) {
        if !self.backup.is_enabled() {
            tracing::debug!("Remote backup not configured, skipping");
            return;
        }
        let csv = match self.storage.export_csv().await {
            Ok(csv) => csv,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to export dataset for backup");
                return;
            }
        };
        match self.backup.upload(&csv).await {
            Ok(()) => tracing::info!(bytes = csv.len(), "Dataset backed up"),
            Err(e) => tracing::warn!(error = %e, "Remote backup failed"),
        }
    }
}
