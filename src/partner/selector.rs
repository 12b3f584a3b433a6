//! Non-repeating message selection
//!
//! Picks uniformly among candidates the session has not shown yet. Once
//! every candidate has been used, repeats are allowed again.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("Candidate pool is empty")]
    EmptyCandidates,
}

/// Choose one candidate and record it in `used`
pub fn select<'a, R: Rng + ?Sized>(
    candidates: &[&'a str],
    used: &mut HashSet<String>,
    rng: &mut R,
) -> Result<&'a str, SelectError> {
    let fresh: Vec<&'a str> = candidates
        .iter()
        .copied()
        .filter(|c| !used.contains(*c))
        .collect();
    let pool: &[&'a str] = if fresh.is_empty() { candidates } else { &fresh };

    let chosen = *pool.choose(rng).ok_or(SelectError::EmptyCandidates)?;
    used.insert(chosen.to_string());
    Ok(chosen)
}
