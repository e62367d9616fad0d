//! Effects produced by state transitions

use super::state::{AttemptId, SessionStateKind};
use crate::llm::ScriptRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the analysis call
    RequestAnalysis {
        attempt: AttemptId,
        transcript: String,
    },

    /// Start the streamed generation call
    RequestGeneration {
        attempt: AttemptId,
        request: ScriptRequest,
    },

    /// Tell subscribers the state changed
    NotifyStateChange { state: SessionStateKind },

    /// Tell subscribers a fragment was appended to the output
    NotifyChunk { text: String },
}

impl Effect {
    pub fn notify_state(state: SessionStateKind) -> Self {
        Effect::NotifyStateChange { state }
    }

    /// Attempt id of the remote call this effect starts, if it starts one
    #[cfg(test)]
    pub fn request_attempt(&self) -> Option<AttemptId> {
        match self {
            Effect::RequestAnalysis { attempt, .. } | Effect::RequestGeneration { attempt, .. } => {
                Some(*attempt)
            }
            _ => None,
        }
    }
}
