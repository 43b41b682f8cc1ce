//! Property-based tests for the state machine
//!
//! Random event sequences are fed through `transition` against the fixture
//! catalog and session invariants are checked after every step.

use super::state::*;
use super::transition::*;
use super::*;
use crate::catalog::{fixtures, Catalog};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Every invariant a session must hold between events
fn is_valid_state(state: &SessionState, catalog: &Catalog) -> bool {
    let symptom_known = state
        .current_symptom
        .as_deref()
        .map_or(true, |s| catalog.symptom(s).is_some());

    let category_known = state
        .current_category
        .as_deref()
        .map_or(true, |c| catalog.category(c).is_some());

    // Answers always form a prefix of the declared flow
    let answers_are_prefixes = state.details.iter().all(|(symptom, answers)| {
        let Some(definition) = catalog.symptom(symptom) else {
            return false;
        };
        let answered = definition
            .flow
            .iter()
            .take_while(|step| answers.contains_key(&step.field_id))
            .count();
        answered == answers.len()
            && definition
                .flow
                .iter()
                .filter_map(|step| answers.get(&step.field_id).map(|v| step.has_value(v)))
                .all(|ok| ok)
    });

    let counts_known = state
        .symptom_counts
        .iter()
        .all(|(s, count)| *count > 0 && catalog.symptom(s).is_some());

    symptom_known && category_known && answers_are_prefixes && counts_known
}

fn clears_session(event: &Event) -> bool {
    matches!(
        event,
        Event::Command {
            command: Command::Start | Command::Reset,
            ..
        } | Event::SummaryReady { .. }
    )
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_symptom() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("headache"),
        Just("sore_throat"),
        Just("chest_pain"),
        Just("cough"),
        Just("rash"),
        Just("ghost"),
    ]
    .prop_map(str::to_string)
}

fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("duration"),
        Just("intensity"),
        Just("vision"),
        Just("onset"),
        Just("mood"),
    ]
    .prop_map(str::to_string)
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("lt_1d"),
        Just("days"),
        Just("mild"),
        Just("severe"),
        Just("yes"),
        Just("no"),
        Just("now"),
        Just("hours"),
        Just("bogus"),
    ]
    .prop_map(str::to_string)
}

fn arb_action() -> impl Strategy<Value = Option<Action>> {
    prop_oneof![
        4 => (arb_symptom(), arb_field(), arb_value()).prop_map(|(symptom, field_id, value)| {
            Some(Action::Detail {
                symptom,
                field_id,
                value,
            })
        }),
        2 => arb_symptom().prop_map(|symptom| Some(Action::PickSymptom { symptom })),
        1 => Just(Some(Action::CategoryBack)),
        1 => Just(None),
    ]
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start),
        Just(Command::Reset),
        Just(Command::Help),
        Just(Command::Finish),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Head and Neck".to_string()),
        Just("Chest".to_string()),
        Just("Skin".to_string()),
        Just("Finish".to_string()),
        arb_symptom(),
        "[a-z ]{1,20}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        1 => (arb_command(), 1i64..1000).prop_map(|(command, message_id)| Event::Command {
            command,
            message_id,
            first_name: None,
        }),
        3 => (arb_text(), 1i64..1000).prop_map(|(text, message_id)| Event::Text { text, message_id }),
        6 => (arb_action(), proptest::option::of(1i64..1000)).prop_map(|(action, message_id)| {
            Event::Callback {
                callback_id: "cb".to_string(),
                message_id,
                action,
            }
        }),
        1 => "[a-zA-Z:. ]{0,40}".prop_map(|text| Event::SummaryReady { text }),
        1 => "[a-z ]{1,20}".prop_map(|text| Event::ChatReplyReady { text }),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Valid state after any sequence of events
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();

        for event in events {
            state = transition(&state, &catalog, event).new_state;
            prop_assert!(is_valid_state(&state, &catalog), "Invalid state: {:?}", state);
        }
    }

    // Counts only ever grow, and by at most one per event, until the session is cleared
    #[test]
    fn prop_counts_monotonic_until_cleared(events in proptest::collection::vec(arb_event(), 0..30)) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();

        for event in events {
            let clears = clears_session(&event);
            let next = transition(&state, &catalog, event).new_state;
            if !clears {
                for (symptom, before) in &state.symptom_counts {
                    let after = next.count(symptom);
                    prop_assert!(after >= *before, "{} went from {} to {}", symptom, before, after);
                }
                let grown: u32 = next.symptom_counts.values().sum::<u32>()
                    - state.symptom_counts.values().sum::<u32>();
                prop_assert!(grown <= 1);
            }
            state = next;
        }
    }

    // A single transition never puts two replaceable messages on screen
    #[test]
    fn prop_at_most_one_ephemeral_per_event(
        events in proptest::collection::vec(arb_event(), 1..30)
    ) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();

        for event in events {
            let result = transition(&state, &catalog, event);
            let ephemerals = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::SendEphemeral { .. }))
                .count();
            prop_assert!(ephemerals <= 1, "effects: {:?}", result.effects);
            state = result.new_state;
        }
    }

    // Every callback is acknowledged exactly once
    #[test]
    fn prop_callbacks_always_answered(
        events in proptest::collection::vec(arb_event(), 0..20),
        action in arb_action(),
    ) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();
        for event in events {
            state = transition(&state, &catalog, event).new_state;
        }

        let result = transition(&state, &catalog, Event::Callback {
            callback_id: "last".to_string(),
            message_id: Some(1),
            action,
        });
        let answers = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::AnswerCallback { callback_id, .. } if callback_id == "last"))
            .count();
        prop_assert_eq!(answers, 1);
    }

    // Reset and start always leave a fresh session
    #[test]
    fn prop_reset_clears_everything(
        events in proptest::collection::vec(arb_event(), 0..30),
        start in any::<bool>(),
    ) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();
        for event in events {
            state = transition(&state, &catalog, event).new_state;
        }

        let command = if start { Command::Start } else { Command::Reset };
        let result = transition(&state, &catalog, Event::Command {
            command,
            message_id: 1,
            first_name: None,
        });
        prop_assert_eq!(result.new_state.phase(), SessionPhase::Idle);
        prop_assert_eq!(&result.new_state, &SessionState::new());
    }

    // Summary requests carry exactly the accumulated session
    #[test]
    fn prop_finish_snapshot_matches_state(events in proptest::collection::vec(arb_event(), 0..30)) {
        let catalog = fixtures::catalog();
        let mut state = SessionState::new();
        for event in events {
            state = transition(&state, &catalog, event).new_state;
        }

        let result = transition(&state, &catalog, Event::Command {
            command: Command::Finish,
            message_id: 1,
            first_name: None,
        });
        let total: u32 = state.symptom_counts.values().sum();
        match &result.effects[0] {
            Effect::RequestSummary { context } => {
                prop_assert_eq!(context.symptoms.len(), total as usize);
                prop_assert_eq!(&context.details, &state.details);
            }
            other => prop_assert!(false, "unexpected effect: {:?}", other),
        }
    }
}
