//! Database schema and types

use crate::partner::{DisclosureDepth, Reciprocity, Timing};
pub use crate::state_machine::state::Ratings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS turn_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    netid TEXT NOT NULL,
    timing_condition TEXT NOT NULL,
    reciprocity_condition TEXT NOT NULL,
    turn INTEGER NOT NULL,
    participant_depth INTEGER NOT NULL,
    partner_depth INTEGER NOT NULL,
    partner_message TEXT NOT NULL,
    trust INTEGER NOT NULL,
    closeness INTEGER NOT NULL,
    comfort INTEGER NOT NULL,
    warmth INTEGER NOT NULL,
    perceived_openness INTEGER NOT NULL,
    reciprocity_rating INTEGER NOT NULL,
    enjoyment INTEGER NOT NULL,
    strategy_adjustment INTEGER NOT NULL,
    strategy_text TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_turn_rows_session ON turn_rows(timestamp, netid);
";

/// Column names shared by the table and the CSV export, in order
pub const CSV_HEADERS: [&str; 17] = [
    "timestamp",
    "netid",
    "timing_condition",
    "reciprocity_condition",
    "turn",
    "participant_depth",
    "partner_depth",
    "partner_message",
    "trust",
    "closeness",
    "comfort",
    "warmth",
    "perceived_openness",
    "reciprocity_rating",
    "enjoyment",
    "strategy_adjustment",
    "strategy_text",
];

/// One persisted line per completed turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRow {
    pub timestamp: DateTime<Utc>,
    pub participant_id: String,
    pub timing: Timing,
    pub reciprocity: Reciprocity,
    pub turn: u32,
    pub participant_depth: DisclosureDepth,
    pub partner_depth: DisclosureDepth,
    pub partner_message: String,
    #[serde(flatten)]
    pub ratings: Ratings,
}

impl TurnRow {
    /// Field values in `CSV_HEADERS` order
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.timestamp.to_rfc3339(),
            self.participant_id.clone(),
            self.timing.to_string(),
            self.reciprocity.to_string(),
            self.turn.to_string(),
            self.participant_depth.to_string(),
            self.partner_depth.to_string(),
            self.partner_message.clone(),
        ];
        record.extend(self.ratings.scores().iter().map(|(_, score)| score.to_string()));
        record.push(self.ratings.strategy_text.clone());
        record
    }
}

/// Totals shown on the admin summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: i64,
    pub sessions: i64,
}
