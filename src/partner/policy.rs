//! Partner depth policy
//!
//! Base depth rises over three turn bands. Reciprocal partners blend that
//! base with the participant's last depth (40/60); guarded partners are
//! capped at mildly personal.

use super::{DisclosureDepth, Reciprocity, Timing};

/// Participant turns per session. The turn bands are thirds of this.
pub const TOTAL_TURNS: u32 = 6;

const BASE_WEIGHT_TENTHS: i64 = 4;
const PARTICIPANT_WEIGHT_TENTHS: i64 = 6;

/// Band index (0, 1 or 2) for a 1-based turn
fn turn_band(turn: u32) -> u8 {
    if turn <= TOTAL_TURNS / 3 {
        0
    } else if turn <= 2 * TOTAL_TURNS / 3 {
        1
    } else {
        2
    }
}

/// Depth the partner drifts toward at this point in the conversation
pub fn base_depth(turn: u32, timing: Timing) -> DisclosureDepth {
    match (timing, turn_band(turn)) {
        (Timing::Early, 0 | 1) | (Timing::Gradual, 1) => DisclosureDepth::MildlyPersonal,
        (Timing::Gradual, 0) => DisclosureDepth::Surface,
        _ => DisclosureDepth::Vulnerable,
    }
}

/// Partner depth for the reply to the participant's choice on `turn`.
///
/// The reciprocal blend rounds half up. It is computed in integer tenths,
/// `(4 * base + 6 * participant + 5) / 10`, so no float rounding is
/// involved. With whole-number depths the blend is always an even number
/// of tenths and never sits exactly on a half.
pub fn next_depth(
    turn: u32,
    participant_last_depth: DisclosureDepth,
    timing: Timing,
    reciprocity: Reciprocity,
) -> DisclosureDepth {
    let base = i64::from(base_depth(turn, timing).level());
    let participant = i64::from(participant_last_depth.level());

    let level = match reciprocity {
        Reciprocity::Reciprocal => {
            let tenths = BASE_WEIGHT_TENTHS * base + PARTICIPANT_WEIGHT_TENTHS * participant;
            (tenths + 5).div_euclid(10)
        }
        Reciprocity::Guarded => base.min(1),
    };

    DisclosureDepth::clamped(level)
}
