//! API request and response types

use crate::db::{DatasetSummary, TurnRow};
use crate::partner::{Condition, DisclosureDepth, TOTAL_TURNS};
use crate::state_machine::{Ratings, SessionState, TurnRecord};
use serde::{Deserialize, Serialize};

/// Request to start a new session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub participant_id: String,
}

/// Request to play one turn
#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    /// Raw level; validated into a `DisclosureDepth` by the handler
    pub depth: i64,
}

/// Post-conversation questionnaire as sent by the client
#[derive(Debug, Deserialize)]
pub struct RatingsRequest {
    pub trust: i64,
    pub closeness: i64,
    pub comfort: i64,
    pub warmth: i64,
    pub perceived_openness: i64,
    pub reciprocity_rating: i64,
    pub enjoyment: i64,
    pub strategy_adjustment: i64,
    #[serde(default)]
    pub strategy_text: String,
}

impl RatingsRequest {
    /// Check every score is on the 1..=7 scale
    pub fn validate(self) -> Result<Ratings, String> {
        let score = |name: &str, value: i64| -> Result<u8, String> {
            u8::try_from(value)
                .ok()
                .filter(|v| (Ratings::MIN_SCORE..=Ratings::MAX_SCORE).contains(v))
                .ok_or_else(|| {
                    format!(
                        "{name} must be between {} and {}, got {value}",
                        Ratings::MIN_SCORE,
                        Ratings::MAX_SCORE
                    )
                })
        };

        Ok(Ratings {
            trust: score("trust", self.trust)?,
            closeness: score("closeness", self.closeness)?,
            comfort: score("comfort", self.comfort)?,
            warmth: score("warmth", self.warmth)?,
            perceived_openness: score("perceived_openness", self.perceived_openness)?,
            reciprocity_rating: score("reciprocity_rating", self.reciprocity_rating)?,
            enjoyment: score("enjoyment", self.enjoyment)?,
            strategy_adjustment: score("strategy_adjustment", self.strategy_adjustment)?,
            strategy_text: self.strategy_text.trim().to_string(),
        })
    }
}

/// One played turn as shown to the participant
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub turn: u32,
    pub participant_depth: DisclosureDepth,
    pub participant_label: &'static str,
    pub partner_message: String,
}

impl From<&TurnRecord> for TurnView {
    fn from(record: &TurnRecord) -> Self {
        Self {
            turn: record.turn,
            participant_depth: record.participant_depth,
            participant_label: record.participant_depth.label(),
            partner_message: record.partner_message.clone(),
        }
    }
}

/// Participant-facing session snapshot. Partner depths are never included.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub state: &'static str,
    pub turn: u32,
    pub total_turns: u32,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_message: Option<String>,
    pub history: Vec<TurnView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl SessionView {
    pub fn new(state: &SessionState, expose_condition: bool) -> Self {
        let session = state.session();
        Self {
            state: state.name(),
            turn: session.map_or(0, |s| s.turn),
            total_turns: TOTAL_TURNS,
            progress: session.map_or(0.0, crate::state_machine::Session::progress),
            opening_message: session.map(|s| s.opening_message.clone()),
            history: session
                .map(|s| s.history.iter().map(TurnView::from).collect())
                .unwrap_or_default(),
            condition: session
                .filter(|_| expose_condition)
                .map(|s| s.condition),
        }
    }
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub session: SessionView,
}

/// Response once ratings are durable
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub saved: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// One selectable depth
#[derive(Debug, Serialize)]
pub struct DepthChoice {
    pub value: DisclosureDepth,
    pub prompt: &'static str,
    pub label: &'static str,
}

/// Response for depth choices
#[derive(Debug, Serialize)]
pub struct DepthsResponse {
    pub depths: Vec<DepthChoice>,
}

/// Response for the admin summary
#[derive(Debug, Serialize)]
pub struct AdminSummaryResponse {
    #[serde(flatten)]
    pub dataset: DatasetSummary,
    pub active_sessions: usize,
}

/// Response for the admin row listing
#[derive(Debug, Serialize)]
pub struct RowsResponse {
    pub rows: Vec<TurnRow>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
