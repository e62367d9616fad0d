//! Events that can occur in a session

use super::state::AttemptId;
use crate::llm::{AnalysisResult, LlmError};

/// Events that trigger state transitions
///
/// User commands carry the attempt id the runtime assigned to them; remote
/// outcomes echo the id of the call that produced them.
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    SubmitTranscript {
        text: String,
        attempt: AttemptId,
    },
    SubmitTopic {
        topic: String,
        attempt: AttemptId,
    },
    Reset,

    // Analysis outcomes
    AnalysisSucceeded {
        attempt: AttemptId,
        result: AnalysisResult,
    },
    AnalysisFailed {
        attempt: AttemptId,
        error: LlmError,
    },

    // Generation stream
    ChunkReceived {
        attempt: AttemptId,
        text: String,
    },
    StreamCompleted {
        attempt: AttemptId,
    },
    StreamFailed {
        attempt: AttemptId,
        error: LlmError,
    },
}

impl Event {
    /// Whether this event comes from the user rather than a remote call
    pub fn is_user_command(&self) -> bool {
        matches!(
            self,
            Event::SubmitTranscript { .. } | Event::SubmitTopic { .. } | Event::Reset
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::SubmitTranscript { .. } => "submit_transcript",
            Event::SubmitTopic { .. } => "submit_topic",
            Event::Reset => "reset",
            Event::AnalysisSucceeded { .. } => "analysis_succeeded",
            Event::AnalysisFailed { .. } => "analysis_failed",
            Event::ChunkReceived { .. } => "chunk_received",
            Event::StreamCompleted { .. } => "stream_completed",
            Event::StreamFailed { .. } => "stream_failed",
        }
    }
}
