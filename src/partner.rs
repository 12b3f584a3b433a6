//! Simulated conversation partner
//!
//! Fixed message tables, the non-repeating message selector and the
//! depth policy that decides how personal the partner's next reply is.

mod condition;
pub mod messages;
pub mod policy;
pub mod selector;

pub use condition::{Condition, ConditionError, DepthError, DisclosureDepth, Reciprocity, Timing};
pub use policy::{next_depth, TOTAL_TURNS};
pub use selector::{select, SelectError};
