//! Disclosure depth and experimental condition types

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid depth: {0} (expected 0, 1 or 2)")]
pub struct DepthError(pub i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Unknown timing condition: {0}")]
    UnknownTiming(String),
    #[error("Unknown reciprocity condition: {0}")]
    UnknownReciprocity(String),
}

// ============================================================================
// Disclosure Depth
// ============================================================================

/// How personal a conversational turn is, ordered by vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum DisclosureDepth {
    /// Small talk, nothing personal
    Surface = 0,
    /// Hobbies, classes, everyday details
    MildlyPersonal = 1,
    /// Feelings, worries, deeper experiences
    Vulnerable = 2,
}

impl DisclosureDepth {
    pub const ALL: [DisclosureDepth; 3] = [
        DisclosureDepth::Surface,
        DisclosureDepth::MildlyPersonal,
        DisclosureDepth::Vulnerable,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Map any integer level into the valid range
    pub fn clamped(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Self::Surface,
            1 => Self::MildlyPersonal,
            _ => Self::Vulnerable,
        }
    }

    /// Transcript summary of a participant reply at this depth
    pub fn label(self) -> &'static str {
        match self {
            Self::Surface => "kept things very surface-level",
            Self::MildlyPersonal => "shared a little personal information",
            Self::Vulnerable => "shared something pretty personal or vulnerable",
        }
    }

    /// Choice text offered to the participant (no numbers shown)
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Surface => "I would keep it very surface-level and not share anything personal.",
            Self::MildlyPersonal => "I would share something a little personal, but not very deep.",
            Self::Vulnerable => "I would share something pretty personal or vulnerable.",
        }
    }
}

impl TryFrom<i64> for DisclosureDepth {
    type Error = DepthError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Surface),
            1 => Ok(Self::MildlyPersonal),
            2 => Ok(Self::Vulnerable),
            other => Err(DepthError(other)),
        }
    }
}

impl From<DisclosureDepth> for u8 {
    fn from(depth: DisclosureDepth) -> Self {
        depth.level()
    }
}

impl fmt::Display for DisclosureDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

// ============================================================================
// Condition
// ============================================================================

/// How quickly the partner warms up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Early,
    Gradual,
}

impl Timing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Gradual => "gradual",
        }
    }
}

impl FromStr for Timing {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early" => Ok(Self::Early),
            "gradual" => Ok(Self::Gradual),
            other => Err(ConditionError::UnknownTiming(other.to_string())),
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the partner mirrors the participant or stays shallow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reciprocity {
    Reciprocal,
    Guarded,
}

impl Reciprocity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reciprocal => "reciprocal",
            Self::Guarded => "guarded",
        }
    }
}

impl FromStr for Reciprocity {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reciprocal" => Ok(Self::Reciprocal),
            "guarded" => Ok(Self::Guarded),
            other => Err(ConditionError::UnknownReciprocity(other.to_string())),
        }
    }
}

impl fmt::Display for Reciprocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (timing, reciprocity) pair fixed for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub timing: Timing,
    pub reciprocity: Reciprocity,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::new(Timing::Early, Reciprocity::Reciprocal),
        Condition::new(Timing::Early, Reciprocity::Guarded),
        Condition::new(Timing::Gradual, Reciprocity::Reciprocal),
        Condition::new(Timing::Gradual, Reciprocity::Guarded),
    ];

    pub const fn new(timing: Timing, reciprocity: Reciprocity) -> Self {
        Self {
            timing,
            reciprocity,
        }
    }

    /// Draw one of the four conditions uniformly
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Self::ALL[0])
    }

    pub fn parse(timing: &str, reciprocity: &str) -> Result<Self, ConditionError> {
        Ok(Self::new(timing.parse()?, reciprocity.parse()?))
    }
}
