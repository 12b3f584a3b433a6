//! Events that can occur in a session

use super::state::Ratings;
use crate::partner::DisclosureDepth;
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Participant events
    Start {
        participant_id: String,
    },
    SubmitTurn {
        depth: DisclosureDepth,
    },
    SubmitRatings {
        ratings: Ratings,
        /// Stamped on every persisted row
        submitted_at: DateTime<Utc>,
    },
    Reset,

    // Persistence outcomes
    PersistSucceeded,
    PersistFailed {
        message: String,
    },
}
