//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::partner::{messages, DisclosureDepth, TOTAL_TURNS};
use chrono::Utc;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_depth() -> impl Strategy<Value = DisclosureDepth> {
    prop_oneof![
        Just(DisclosureDepth::Surface),
        Just(DisclosureDepth::MildlyPersonal),
        Just(DisclosureDepth::Vulnerable),
    ]
}

fn arb_score() -> impl Strategy<Value = u8> {
    Ratings::MIN_SCORE..=Ratings::MAX_SCORE
}

fn arb_ratings() -> impl Strategy<Value = Ratings> {
    (
        proptest::collection::vec(arb_score(), 8),
        "[a-zA-Z ]{0,40}",
    )
        .prop_map(|(s, strategy_text)| Ratings {
            trust: s[0],
            closeness: s[1],
            comfort: s[2],
            warmth: s[3],
            perceived_openness: s[4],
            reciprocity_rating: s[5],
            enjoyment: s[6],
            strategy_adjustment: s[7],
            strategy_text,
        })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => "[a-z0-9 ]{0,8}".prop_map(|participant_id| Event::Start { participant_id }),
        4 => arb_depth().prop_map(|depth| Event::SubmitTurn { depth }),
        1 => arb_ratings().prop_map(|ratings| Event::SubmitRatings {
            ratings,
            submitted_at: Utc::now(),
        }),
        1 => Just(Event::Reset),
        1 => Just(Event::PersistSucceeded),
        1 => "[a-z ]{1,20}".prop_map(|message| Event::PersistFailed { message }),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_session(session: &Session) -> bool {
    let contiguous = session
        .history
        .iter()
        .enumerate()
        .all(|(i, record)| record.turn as usize == i + 1);
    let messages_recorded = session
        .history
        .iter()
        .all(|record| session.used_messages.contains(&record.partner_message));

    session.history.len() as u32 == session.turn - 1
        && contiguous
        && messages_recorded
        && session.opening_depth <= DisclosureDepth::MildlyPersonal
        && session.turn <= TOTAL_TURNS + 1
}

fn is_valid_state(state: &SessionState) -> bool {
    match state {
        SessionState::Uninitialized => true,
        SessionState::Active { session } => is_valid_session(session) && !session.is_finished(),
        SessionState::Finished { session } | SessionState::Saving { session, .. } => {
            is_valid_session(session) && session.history.len() == TOTAL_TURNS as usize
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Valid state after any sequence of events
    #[test]
    fn prop_transitions_preserve_validity(
        seed in any::<u64>(),
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = SessionState::Uninitialized;

        for event in events {
            match transition(&state, event, &mut rng) {
                Ok(result) => {
                    state = result.new_state;
                    prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
                }
                Err(TransitionError::Configuration(msg)) => {
                    prop_assert!(false, "Configuration defect: {}", msg);
                }
                Err(_) => { /* Rejected input leaves state as it was */ }
            }
        }
    }

    // Invariant 2: Condition never changes within a session
    #[test]
    fn prop_condition_is_immutable(
        seed in any::<u64>(),
        depths in proptest::collection::vec(arb_depth(), 0..=6)
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = transition(
            &SessionState::Uninitialized,
            Event::Start { participant_id: "p1".to_string() },
            &mut rng,
        ).unwrap().new_state;
        let condition = state.session().unwrap().condition;

        for depth in depths {
            state = transition(&state, Event::SubmitTurn { depth }, &mut rng).unwrap().new_state;
            prop_assert_eq!(state.session().unwrap().condition, condition);
        }
    }

    // Invariant 3: History length tracks the turn counter; finished exactly at six
    #[test]
    fn prop_history_matches_turn_counter(
        seed in any::<u64>(),
        depths in proptest::collection::vec(arb_depth(), 6)
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = transition(
            &SessionState::Uninitialized,
            Event::Start { participant_id: "p1".to_string() },
            &mut rng,
        ).unwrap().new_state;

        for depth in depths {
            state = transition(&state, Event::SubmitTurn { depth }, &mut rng).unwrap().new_state;
            let session = state.session().unwrap();
            prop_assert_eq!(session.history.len() as u32, session.turn - 1);
            prop_assert_eq!(state.is_finished(), session.history.len() == TOTAL_TURNS as usize);
        }
        let finished = matches!(state, SessionState::Finished { .. });
        prop_assert!(finished, "Expected Finished, got {:?}", state);
    }

    // Invariant 4: Reset discards everything unless a save is in flight
    #[test]
    fn prop_reset_discards_session(
        seed in any::<u64>(),
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = SessionState::Uninitialized;
        for event in events {
            if let Ok(result) = transition(&state, event, &mut rng) {
                state = result.new_state;
            }
        }

        let result = transition(&state, Event::Reset, &mut rng);
        if matches!(state, SessionState::Saving { .. }) {
            prop_assert!(matches!(result, Err(TransitionError::InvalidState(_))));
        } else {
            let result = result.unwrap();
            prop_assert_eq!(result.new_state, SessionState::Uninitialized);
            prop_assert!(result.effects.is_empty());
        }
    }

    // Invariant 5: No partner message repeats while its pool has fresh entries
    #[test]
    fn prop_no_repeat_before_exhaustion(
        seed in any::<u64>(),
        depths in proptest::collection::vec(arb_depth(), 6)
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = transition(
            &SessionState::Uninitialized,
            Event::Start { participant_id: "p1".to_string() },
            &mut rng,
        ).unwrap().new_state;
        for depth in depths {
            state = transition(&state, Event::SubmitTurn { depth }, &mut rng).unwrap().new_state;
        }

        let session = state.session().unwrap();
        for depth in DisclosureDepth::ALL {
            let shown: Vec<&str> = session
                .history
                .iter()
                .filter(|r| r.partner_depth == depth)
                .map(|r| r.partner_message.as_str())
                .collect();
            let pool_size = messages::content(depth).len();
            let mut distinct = shown.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), shown.len().min(pool_size));
        }
    }
}
