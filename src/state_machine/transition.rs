//! Pure state transition function

use super::state::{AttemptId, SessionStateKind};
use super::{Effect, Event, SessionState};
use crate::llm::{AnalysisResult, LlmError, ScriptRequest};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Enter `state` and announce it
    fn enter(state: SessionState) -> Self {
        let kind = state.kind();
        Self::new(state).with_effect(Effect::notify_state(kind))
    }
}

/// Reasons a user command is refused. State is never changed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    #[error("A request is already in progress")]
    Busy,
    #[error("No analysis available yet, submit a transcript first")]
    NoAnalysis,
    #[error("Session must be reset before submitting a new transcript")]
    ResetRequired,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Remote outcomes that don't belong to the call in flight (for example
/// chunks arriving after a reset) leave the state untouched.
pub fn transition(
    state: &SessionState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Reset: always allowed, never aborts the remote call
        // ============================================================
        (_, Event::Reset) => Ok(TransitionResult::enter(SessionState::Idle)),

        // ============================================================
        // Transcript submission
        // ============================================================
        (SessionState::Idle, Event::SubmitTranscript { text, attempt }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput("Transcript"));
            }
            Ok(TransitionResult::enter(SessionState::Analyzing {
                attempt,
                transcript: text.clone(),
            })
            .with_effect(Effect::RequestAnalysis {
                attempt,
                transcript: text,
            }))
        }

        (
            SessionState::Analyzing { .. } | SessionState::Generating { .. },
            Event::SubmitTranscript { .. },
        ) => Err(TransitionError::Busy),

        (_, Event::SubmitTranscript { .. }) => Err(TransitionError::ResetRequired),

        // ============================================================
        // Analysis outcome
        // ============================================================
        (
            SessionState::Analyzing {
                attempt,
                transcript,
            },
            Event::AnalysisSucceeded {
                attempt: done,
                result,
            },
        ) if *attempt == done => Ok(TransitionResult::enter(SessionState::AnalysisComplete {
            transcript: transcript.clone(),
            analysis: result,
        })),

        (
            SessionState::Analyzing { attempt, .. },
            Event::AnalysisFailed {
                attempt: done,
                error,
            },
        ) if *attempt == done => {
            // Nothing was generated yet, so the output stays empty
            Ok(enter_error(&error, String::new()))
        }

        // ============================================================
        // Topic submission
        // ============================================================
        (
            SessionState::AnalysisComplete {
                transcript,
                analysis,
            }
            | SessionState::Complete {
                transcript,
                analysis,
                ..
            },
            Event::SubmitTopic { topic, attempt },
        ) => start_generation(transcript, analysis, &topic, attempt),

        (SessionState::Generating { .. }, Event::SubmitTopic { .. }) => Err(TransitionError::Busy),

        (_, Event::SubmitTopic { .. }) => Err(TransitionError::NoAnalysis),

        // ============================================================
        // Generation stream
        // ============================================================
        (SessionState::Generating { attempt, .. }, Event::ChunkReceived { attempt: from, text })
            if *attempt == from =>
        {
            let mut next = state.clone();
            next.append_chunk(from, &text);
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyChunk { text }))
        }

        (
            SessionState::Generating {
                attempt,
                transcript,
                analysis,
                topic,
                output,
            },
            Event::StreamCompleted { attempt: done },
        ) if *attempt == done => Ok(TransitionResult::enter(SessionState::Complete {
            transcript: transcript.clone(),
            analysis: analysis.clone(),
            topic: topic.clone(),
            output: output.clone(),
        })),

        (
            SessionState::Generating {
                attempt, output, ..
            },
            Event::StreamFailed {
                attempt: done,
                error,
            },
        ) if *attempt == done => Ok(enter_error(&error, output.clone())),

        // ============================================================
        // Stale outcomes: a reset or newer attempt superseded the call
        // ============================================================
        (
            _,
            Event::AnalysisSucceeded { .. }
            | Event::AnalysisFailed { .. }
            | Event::ChunkReceived { .. }
            | Event::StreamCompleted { .. }
            | Event::StreamFailed { .. },
        ) => Ok(TransitionResult::new(state.clone())),
    }
}

fn start_generation(
    transcript: &str,
    analysis: &AnalysisResult,
    topic: &str,
    attempt: AttemptId,
) -> Result<TransitionResult, TransitionError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(TransitionError::EmptyInput("Topic"));
    }

    let request = ScriptRequest {
        transcript: transcript.to_string(),
        structure_summary: analysis.structure_summary.clone(),
        topic: topic.to_string(),
    };

    // The output buffer starts empty when the attempt starts, not when the
    // first chunk arrives
    Ok(TransitionResult::enter(SessionState::Generating {
        attempt,
        transcript: transcript.to_string(),
        analysis: analysis.clone(),
        topic: topic.to_string(),
        output: String::new(),
    })
    .with_effect(Effect::RequestGeneration { attempt, request }))
}

fn enter_error(error: &LlmError, output: String) -> TransitionResult {
    TransitionResult::new(SessionState::Error {
        message: error.message.clone(),
        error_kind: error.kind,
        output,
    })
    .with_effect(Effect::notify_state(SessionStateKind::Error))
}
