//! Domain types exchanged with the generative service

use super::LlmError;
use serde::{Deserialize, Serialize};

/// Structured output of the analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub structure_summary: String,
    pub suggested_topics: Vec<String>,
}

impl AnalysisResult {
    /// Parse the model's JSON payload.
    ///
    /// The summary is trimmed; topics are trimmed, blanks dropped and
    /// duplicates removed keeping the first occurrence. A result with no
    /// summary or no topics left is rejected.
    pub fn from_json(payload: &str) -> Result<Self, LlmError> {
        let raw: AnalysisResult = serde_json::from_str(payload)
            .map_err(|e| LlmError::parse(format!("Analysis payload is not valid JSON: {e}")))?;
        raw.normalized()
    }

    fn normalized(self) -> Result<Self, LlmError> {
        let structure_summary = self.structure_summary.trim().to_string();
        if structure_summary.is_empty() {
            return Err(LlmError::parse("Analysis payload has an empty structureSummary"));
        }

        let mut suggested_topics: Vec<String> = Vec::with_capacity(self.suggested_topics.len());
        for topic in self.suggested_topics {
            let topic = topic.trim();
            if !topic.is_empty() && !suggested_topics.iter().any(|t| t == topic) {
                suggested_topics.push(topic.to_string());
            }
        }
        if suggested_topics.is_empty() {
            return Err(LlmError::parse("Analysis payload has no suggestedTopics"));
        }

        Ok(Self {
            structure_summary,
            suggested_topics,
        })
    }
}

/// Everything the generation call needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptRequest {
    pub transcript: String,
    pub structure_summary: String,
    pub topic: String,
}
