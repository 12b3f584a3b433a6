//! Pure state transition function
//!
//! Given the same state, event and random source, `transition` always
//! produces the same new state and effects, with no I/O.

use super::state::{Ratings, Session, TurnRecord};
use super::{Effect, Event, SessionState};
use crate::db::TurnRow;
use crate::partner::{messages, next_depth, select, Condition, DisclosureDepth, SelectError};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Configuration defect: {0}")]
    Configuration(String),
}

impl From<SelectError> for TransitionError {
    fn from(e: SelectError) -> Self {
        TransitionError::Configuration(e.to_string())
    }
}

/// Pure transition function
pub fn transition<R: Rng + ?Sized>(
    state: &SessionState,
    event: Event,
    rng: &mut R,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Session start
        // ============================================================
        (SessionState::Uninitialized, Event::Start { participant_id }) => {
            let participant_id = participant_id.trim();
            if participant_id.is_empty() {
                return Err(TransitionError::InvalidInput(
                    "Participant identifier must not be empty".to_string(),
                ));
            }
            let session = start_session(participant_id, rng)?;
            Ok(TransitionResult::new(SessionState::Active { session }))
        }

        (state, Event::Start { .. }) => Err(TransitionError::InvalidState(format!(
            "Session already started (state: {})",
            state.name()
        ))),

        // ============================================================
        // Turns
        // ============================================================
        (SessionState::Active { session }, Event::SubmitTurn { depth }) => {
            if session.is_finished() {
                return Err(TransitionError::InvalidState(format!(
                    "All {} turns already played",
                    session.history.len()
                )));
            }
            let session = play_turn(session, depth, rng)?;
            if session.is_finished() {
                Ok(TransitionResult::new(SessionState::Finished { session }))
            } else {
                Ok(TransitionResult::new(SessionState::Active { session }))
            }
        }

        (state, Event::SubmitTurn { .. }) => Err(TransitionError::InvalidState(format!(
            "Cannot submit a turn while {}",
            state.name()
        ))),

        // ============================================================
        // Ratings and saving
        // ============================================================
        (SessionState::Finished { session }, Event::SubmitRatings { ratings, submitted_at }) => {
            let rows = build_rows(session, &ratings, submitted_at);
            Ok(TransitionResult::new(SessionState::Saving {
                session: session.clone(),
                ratings,
            })
            .with_effect(Effect::PersistSession { rows }))
        }

        (state, Event::SubmitRatings { .. }) => Err(TransitionError::InvalidState(format!(
            "Ratings are only accepted once the conversation is finished (state: {})",
            state.name()
        ))),

        // Rows are durable: the session's job is done
        (SessionState::Saving { .. }, Event::PersistSucceeded) => {
            Ok(TransitionResult::new(SessionState::Uninitialized)
                .with_effect(Effect::BackupDataset))
        }

        // Keep everything so the participant can retry
        (SessionState::Saving { session, .. }, Event::PersistFailed { .. }) => {
            Ok(TransitionResult::new(SessionState::Finished {
                session: session.clone(),
            }))
        }

        // ============================================================
        // Reset
        // ============================================================
        (SessionState::Saving { .. }, Event::Reset) => Err(TransitionError::InvalidState(
            "Cannot reset while the session is being saved".to_string(),
        )),

        (_, Event::Reset) => Ok(TransitionResult::new(SessionState::Uninitialized)),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidState(format!(
            "No transition from {} with event {:?}",
            state.name(),
            event
        ))),
    }
}

// Helper functions

fn start_session<R: Rng + ?Sized>(
    participant_id: &str,
    rng: &mut R,
) -> Result<Session, TransitionError> {
    let condition = Condition::sample(rng);
    let opening = messages::opening(condition);
    let mut used_messages = HashSet::new();
    let opening_message = select(opening.messages, &mut used_messages, rng)?;

    Ok(Session {
        participant_id: participant_id.to_string(),
        condition,
        turn: 1,
        history: Vec::new(),
        opening_depth: opening.depth,
        opening_message: opening_message.to_string(),
        used_messages,
    })
}

fn play_turn<R: Rng + ?Sized>(
    session: &Session,
    participant_depth: DisclosureDepth,
    rng: &mut R,
) -> Result<Session, TransitionError> {
    let mut next = session.clone();
    let partner_depth = next_depth(
        next.turn,
        participant_depth,
        next.condition.timing,
        next.condition.reciprocity,
    );
    let partner_message = select(
        messages::content(partner_depth),
        &mut next.used_messages,
        rng,
    )?;

    next.history.push(TurnRecord {
        turn: next.turn,
        participant_depth,
        partner_depth,
        partner_message: partner_message.to_string(),
    });
    next.turn += 1;
    Ok(next)
}

fn build_rows(session: &Session, ratings: &Ratings, submitted_at: DateTime<Utc>) -> Vec<TurnRow> {
    session
        .history
        .iter()
        .map(|record| TurnRow {
            timestamp: submitted_at,
            participant_id: session.participant_id.clone(),
            timing: session.condition.timing,
            reciprocity: session.condition.reciprocity,
            turn: record.turn,
            participant_depth: record.participant_depth,
            partner_depth: record.partner_depth,
            partner_message: record.partner_message.clone(),
            ratings: ratings.clone(),
        })
        .collect()
}
