//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to analyse a transcript
#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
}

/// Request to generate a script for a topic
#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// Response for an accepted command
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

impl AcceptedResponse {
    pub fn yes() -> Self {
        Self { accepted: true }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
