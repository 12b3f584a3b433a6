//! Database module for the disclosure game
//!
//! Stores one row per completed turn and exports the dataset as CSV.

mod schema;

pub use schema::*;

use crate::partner::{DisclosureDepth, Reciprocity, Timing};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Export failed: {0}")]
    Export(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Turn Rows ====================

    /// Append a finished session's rows. All rows land or none do.
    pub fn append_rows(&self, rows: &[TurnRow]) -> DbResult<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO turn_rows (timestamp, netid, timing_condition, reciprocity_condition, turn,
                    participant_depth, partner_depth, partner_message, trust, closeness, comfort, warmth,
                    perceived_openness, reciprocity_rating, enjoyment, strategy_adjustment, strategy_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for row in rows {
                let r = &row.ratings;
                stmt.execute(params![
                    row.timestamp.to_rfc3339(),
                    row.participant_id,
                    row.timing.as_str(),
                    row.reciprocity.as_str(),
                    row.turn,
                    row.participant_depth.level(),
                    row.partner_depth.level(),
                    row.partner_message,
                    r.trust,
                    r.closeness,
                    r.comfort,
                    r.warmth,
                    r.perceived_openness,
                    r.reciprocity_rating,
                    r.enjoyment,
                    r.strategy_adjustment,
                    r.strategy_text,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// All rows in insertion order
    pub fn list_rows(&self) -> DbResult<Vec<TurnRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT timestamp, netid, timing_condition, reciprocity_condition, turn,
                    participant_depth, partner_depth, partner_message, trust, closeness, comfort, warmth,
                    perceived_openness, reciprocity_rating, enjoyment, strategy_adjustment, strategy_text
             FROM turn_rows ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], parse_turn_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn count_rows(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM turn_rows", [], |row| row.get(0))
            .map_err(DbError::from)
    }

    /// Number of saved sessions, keyed by submission time and participant
    pub fn count_sessions(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT timestamp, netid FROM turn_rows)",
            [],
            |row| row.get(0),
        )
        .map_err(DbError::from)
    }

    pub fn summary(&self) -> DbResult<DatasetSummary> {
        Ok(DatasetSummary {
            rows: self.count_rows()?,
            sessions: self.count_sessions()?,
        })
    }

    /// Render every row as CSV with a header line
    pub fn export_csv(&self) -> DbResult<String> {
        let rows = self.list_rows()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;
        for row in &rows {
            writer.write_record(row.to_record())?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DbError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DbError::Export(e.to_string()))
    }
}

/// Parse a turn row from the database
fn parse_turn_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TurnRow> {
    let timestamp: String = row.get(0)?;
    let timing: String = row.get(2)?;
    let reciprocity: String = row.get(3)?;

    Ok(TurnRow {
        timestamp: parse_datetime(&timestamp).map_err(|e| conversion_error(0, Type::Text, e))?,
        participant_id: row.get(1)?,
        timing: timing
            .parse::<Timing>()
            .map_err(|e| conversion_error(2, Type::Text, e))?,
        reciprocity: reciprocity
            .parse::<Reciprocity>()
            .map_err(|e| conversion_error(3, Type::Text, e))?,
        turn: row.get(4)?,
        participant_depth: parse_depth(row, 5)?,
        partner_depth: parse_depth(row, 6)?,
        partner_message: row.get(7)?,
        ratings: Ratings {
            trust: row.get(8)?,
            closeness: row.get(9)?,
            comfort: row.get(10)?,
            warmth: row.get(11)?,
            perceived_openness: row.get(12)?,
            reciprocity_rating: row.get(13)?,
            enjoyment: row.get(14)?,
            strategy_adjustment: row.get(15)?,
            strategy_text: row.get(16)?,
        },
    })
}

fn parse_depth(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DisclosureDepth> {
    let level: i64 = row.get(idx)?;
    DisclosureDepth::try_from(level).map_err(|e| conversion_error(idx, Type::Integer, e))
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
