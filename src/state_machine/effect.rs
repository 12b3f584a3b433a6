//! Effects produced by state transitions

use crate::db::TurnRow;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append the finished session's rows to durable storage
    PersistSession { rows: Vec<TurnRow> },

    /// Push the full dataset to the remote backup, if one is configured
    BackupDataset,
}
