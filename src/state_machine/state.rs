//! Session state types

use crate::llm::{AnalysisResult, LlmErrorKind};
use serde::{Deserialize, Serialize};

/// Identifies one remote call. Outcomes carrying a different id than the
/// call currently in flight are stale and ignored.
pub type AttemptId = u64;

/// Session state
///
/// Each variant owns exactly the data that exists in that phase, so a
/// generation without an analysis cannot be represented.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for a transcript
    #[default]
    Idle,

    /// Analysis request in flight
    Analyzing {
        attempt: AttemptId,
        transcript: String,
    },

    /// Analysis stored, waiting for a topic
    AnalysisComplete {
        transcript: String,
        analysis: AnalysisResult,
    },

    /// Script stream in flight; `output` only ever grows
    Generating {
        attempt: AttemptId,
        transcript: String,
        analysis: AnalysisResult,
        topic: String,
        output: String,
    },

    /// Stream finished. A new topic may still be submitted.
    Complete {
        transcript: String,
        analysis: AnalysisResult,
        topic: String,
        output: String,
    },

    /// Either call failed. Only a reset leaves this state.
    Error {
        message: String,
        error_kind: LlmErrorKind,
        /// Whatever had been streamed before the failure
        output: String,
    },
}

/// Payload-free tag of [`SessionState`], for clients and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStateKind {
    Idle,
    Analyzing,
    AnalysisComplete,
    Generating,
    Complete,
    Error,
}

impl SessionStateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::AnalysisComplete => "analysis_complete",
            Self::Generating => "generating",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl SessionState {
    pub fn kind(&self) -> SessionStateKind {
        match self {
            SessionState::Idle => SessionStateKind::Idle,
            SessionState::Analyzing { .. } => SessionStateKind::Analyzing,
            SessionState::AnalysisComplete { .. } => SessionStateKind::AnalysisComplete,
            SessionState::Generating { .. } => SessionStateKind::Generating,
            SessionState::Complete { .. } => SessionStateKind::Complete,
            SessionState::Error { .. } => SessionStateKind::Error,
        }
    }

    /// Check if a remote call is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Analyzing { .. } | SessionState::Generating { .. }
        )
    }

    /// Attempt id of the outstanding remote call, if any
    pub fn in_flight_attempt(&self) -> Option<AttemptId> {
        match self {
            SessionState::Analyzing { attempt, .. } | SessionState::Generating { attempt, .. } => {
                Some(*attempt)
            }
            _ => None,
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            SessionState::Analyzing { transcript, .. }
            | SessionState::AnalysisComplete { transcript, .. }
            | SessionState::Generating { transcript, .. }
            | SessionState::Complete { transcript, .. } => Some(transcript),
            SessionState::Idle | SessionState::Error { .. } => None,
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            SessionState::AnalysisComplete { analysis, .. }
            | SessionState::Generating { analysis, .. }
            | SessionState::Complete { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            SessionState::Generating { topic, .. } | SessionState::Complete { topic, .. } => {
                Some(topic)
            }
            _ => None,
        }
    }

    /// Generated script so far (empty outside generation)
    pub fn output(&self) -> &str {
        match self {
            SessionState::Generating { output, .. }
            | SessionState::Complete { output, .. }
            | SessionState::Error { output, .. } => output,
            _ => "",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Append a fragment to the output of generation `attempt`.
    ///
    /// Returns `false`, leaving the state untouched, when no generation or
    /// a different attempt is in flight.
    pub fn append_chunk(&mut self, from: AttemptId, text: &str) -> bool {
        match self {
            SessionState::Generating {
                attempt, output, ..
            } if *attempt == from => {
                output.push_str(text);
                true
            }
            _ => false,
        }
    }
}
