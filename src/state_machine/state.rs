//! Session state types

use crate::partner::{Condition, DisclosureDepth, TOTAL_TURNS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Turn Records
// ============================================================================

/// One completed participant turn and the partner's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 1-based, contiguous
    pub turn: u32,
    pub participant_depth: DisclosureDepth,
    pub partner_depth: DisclosureDepth,
    pub partner_message: String,
}

/// Post-conversation questionnaire answers.
///
/// Each score is expected in 1..=7; the API checks the range before the
/// ratings reach the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub trust: u8,
    pub closeness: u8,
    pub comfort: u8,
    pub warmth: u8,
    pub perceived_openness: u8,
    pub reciprocity_rating: u8,
    pub enjoyment: u8,
    pub strategy_adjustment: u8,
    #[serde(default)]
    pub strategy_text: String,
}

impl Ratings {
    pub const MIN_SCORE: u8 = 1;
    pub const MAX_SCORE: u8 = 7;

    /// Named scores in persisted column order
    pub fn scores(&self) -> [(&'static str, u8); 8] {
        [
            ("trust", self.trust),
            ("closeness", self.closeness),
            ("comfort", self.comfort),
            ("warmth", self.warmth),
            ("perceived_openness", self.perceived_openness),
            ("reciprocity_rating", self.reciprocity_rating),
            ("enjoyment", self.enjoyment),
            ("strategy_adjustment", self.strategy_adjustment),
        ]
    }
}

// ============================================================================
// Session
// ============================================================================

/// One participant's run through the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub participant_id: String,
    /// Fixed at start
    pub condition: Condition,
    /// Next turn to be played; `TOTAL_TURNS + 1` once finished
    pub turn: u32,
    pub history: Vec<TurnRecord>,
    pub opening_depth: DisclosureDepth,
    pub opening_message: String,
    /// Partner messages already shown in this session
    #[serde(default)]
    pub used_messages: HashSet<String>,
}

impl Session {
    pub fn is_finished(&self) -> bool {
        self.turn > TOTAL_TURNS
    }

    /// Fraction of turns completed, 1.0 once finished
    pub fn progress(&self) -> f64 {
        if self.is_finished() {
            1.0
        } else {
            f64::from(self.turn - 1) / f64::from(TOTAL_TURNS)
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No session; waiting for a participant to start
    #[default]
    Uninitialized,

    /// Participant is choosing depths, turn <= `TOTAL_TURNS`
    Active { session: Session },

    /// All turns played, waiting for ratings
    Finished { session: Session },

    /// Ratings received, rows are being written
    Saving { session: Session, ratings: Ratings },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Active { .. } => "active",
            SessionState::Finished { .. } => "finished",
            SessionState::Saving { .. } => "saving",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Uninitialized => None,
            SessionState::Active { session }
            | SessionState::Finished { session }
            | SessionState::Saving { session, .. } => Some(session),
        }
    }

    /// Check whether the conversation part is over
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionState::Finished { .. } | SessionState::Saving { .. }
        )
    }
}
