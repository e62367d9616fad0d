//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::llm::{AnalysisResult, LlmError, LlmErrorKind};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_analysis() -> impl Strategy<Value = AnalysisResult> {
    (
        "[a-zA-Z ]{1,40}",
        proptest::collection::vec("[a-zA-Z ]{1,20}", 1..4),
    )
        .prop_map(|(structure_summary, suggested_topics)| AnalysisResult {
            structure_summary,
            suggested_topics,
        })
}

fn arb_error() -> impl Strategy<Value = LlmError> {
    (
        prop_oneof![
            Just(LlmErrorKind::Configuration),
            Just(LlmErrorKind::EmptyResponse),
            Just(LlmErrorKind::Parse),
            Just(LlmErrorKind::Stream),
        ],
        "[a-z ]{1,30}",
    )
        .prop_map(|(kind, message)| LlmError::new(kind, message))
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        (1u64..10, "[a-z ]{1,30}")
            .prop_map(|(attempt, transcript)| SessionState::Analyzing { attempt, transcript }),
        ("[a-z ]{1,30}", arb_analysis()).prop_map(|(transcript, analysis)| {
            SessionState::AnalysisComplete {
                transcript,
                analysis,
            }
        }),
        (1u64..10, "[a-z ]{1,30}", arb_analysis(), "[a-z]{1,10}", "[a-z ]{0,30}").prop_map(
            |(attempt, transcript, analysis, topic, output)| SessionState::Generating {
                attempt,
                transcript,
                analysis,
                topic,
                output,
            }
        ),
        ("[a-z ]{1,30}", arb_analysis(), "[a-z]{1,10}", "[a-z ]{0,30}").prop_map(
            |(transcript, analysis, topic, output)| SessionState::Complete {
                transcript,
                analysis,
                topic,
                output,
            }
        ),
        (arb_error(), "[a-z ]{0,30}").prop_map(|(error, output)| SessionState::Error {
            message: error.message,
            error_kind: error.kind,
            output,
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        ("[a-z ]{0,30}", 1u64..10)
            .prop_map(|(text, attempt)| Event::SubmitTranscript { text, attempt }),
        ("[a-z ]{0,10}", 1u64..10)
            .prop_map(|(topic, attempt)| Event::SubmitTopic { topic, attempt }),
        Just(Event::Reset),
        (1u64..10, arb_analysis())
            .prop_map(|(attempt, result)| Event::AnalysisSucceeded { attempt, result }),
        (1u64..10, arb_error())
            .prop_map(|(attempt, error)| Event::AnalysisFailed { attempt, error }),
        (1u64..10, "[a-z ]{1,10}")
            .prop_map(|(attempt, text)| Event::ChunkReceived { attempt, text }),
        (1u64..10).prop_map(|attempt| Event::StreamCompleted { attempt }),
        (1u64..10, arb_error()).prop_map(|(attempt, error)| Event::StreamFailed { attempt, error }),
    ]
}

fn arb_outcome_event() -> impl Strategy<Value = Event> {
    arb_event().prop_filter("remote outcomes only", |e| !e.is_user_command())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Reset from anywhere lands in Idle with nothing left over, and a
    /// second reset observes the same state
    #[test]
    fn prop_reset_always_idle(state in arb_state()) {
        let once = transition(&state, Event::Reset).unwrap().new_state;
        prop_assert_eq!(&once, &SessionState::Idle);
        prop_assert!(once.transcript().is_none());
        prop_assert!(once.analysis().is_none());
        prop_assert_eq!(once.output(), "");

        let twice = transition(&once, Event::Reset).unwrap().new_state;
        prop_assert_eq!(once, twice);
    }

    /// Without an analysis, a topic never starts a generation
    #[test]
    fn prop_no_generation_without_analysis(
        state in arb_state(),
        topic in "[a-z ]{0,10}",
        attempt in 1u64..10,
    ) {
        prop_assume!(state.analysis().is_none());
        let result = transition(&state, Event::SubmitTopic { topic, attempt });
        prop_assert!(result.is_err());
    }

    /// A started request always belongs to the attempt now in flight
    #[test]
    fn prop_started_request_matches_in_flight_attempt(state in arb_state(), event in arb_event()) {
        if let Ok(result) = transition(&state, event) {
            for effect in &result.effects {
                if let Some(attempt) = effect.request_attempt() {
                    prop_assert_eq!(result.new_state.in_flight_attempt(), Some(attempt));
                }
            }
        }
    }

    /// Outcomes for an attempt that isn't in flight change nothing
    #[test]
    fn prop_stale_outcomes_are_noops(state in arb_state(), event in arb_outcome_event()) {
        let event_attempt = match &event {
            Event::AnalysisSucceeded { attempt, .. }
            | Event::AnalysisFailed { attempt, .. }
            | Event::ChunkReceived { attempt, .. }
            | Event::StreamCompleted { attempt }
            | Event::StreamFailed { attempt, .. } => *attempt,
            _ => unreachable!(),
        };
        prop_assume!(state.in_flight_attempt() != Some(event_attempt));

        let result = transition(&state, event).unwrap();
        prop_assert_eq!(result.new_state, state);
        prop_assert!(result.effects.is_empty());
    }

    /// The output buffer is exactly the concatenation of the fragments
    #[test]
    fn prop_chunks_concatenate_in_order(
        analysis in arb_analysis(),
        chunks in proptest::collection::vec("[a-zA-Z0-9 #\n]{1,20}", 0..20),
        fail in any::<bool>(),
    ) {
        let mut state = SessionState::AnalysisComplete {
            transcript: "t".to_string(),
            analysis,
        };
        state = transition(&state, Event::SubmitTopic { topic: "B".to_string(), attempt: 1 })
            .unwrap()
            .new_state;
        for text in &chunks {
            state = transition(&state, Event::ChunkReceived { attempt: 1, text: text.clone() })
                .unwrap()
                .new_state;
        }
        let end = if fail {
            Event::StreamFailed { attempt: 1, error: LlmError::stream("boom") }
        } else {
            Event::StreamCompleted { attempt: 1 }
        };
        state = transition(&state, end).unwrap().new_state;

        let expected = if fail { SessionStateKind::Error } else { SessionStateKind::Complete };
        prop_assert_eq!(state.kind(), expected);
        prop_assert_eq!(state.output(), chunks.concat());
    }

    /// Appending in place gives the same state as the pure transition
    #[test]
    fn prop_append_chunk_matches_transition(
        state in arb_state(),
        attempt in 1u64..10,
        text in "[a-z ]{1,10}",
    ) {
        let mut in_place = state.clone();
        let appended = in_place.append_chunk(attempt, &text);

        let result = transition(&state, Event::ChunkReceived { attempt, text: text.clone() })
            .unwrap();
        prop_assert_eq!(&in_place, &result.new_state);
        if appended {
            prop_assert_eq!(result.effects, vec![Effect::NotifyChunk { text }]);
        } else {
            prop_assert!(result.effects.is_empty());
            prop_assert_eq!(&in_place, &state);
        }
    }

    /// Random walks keep at most one call in flight
    #[test]
    fn prop_single_request_in_flight(events in proptest::collection::vec(arb_event(), 1..30)) {
        let mut state = SessionState::Idle;
        for event in events {
            let was_busy = state.is_busy();
            if let Ok(result) = transition(&state, event) {
                let starts = result
                    .effects
                    .iter()
                    .filter(|e| e.request_attempt().is_some())
                    .count();
                prop_assert!(starts <= 1);
                if was_busy {
                    prop_assert_eq!(starts, 0);
                }
                state = result.new_state;
            }
        }
    }
}
