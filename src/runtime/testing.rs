//! Mock implementations for testing
//!
//! These mocks enable runtime and API tests without real I/O.

use crate::llm::{AnalysisResult, LlmError, ScriptGenerator, ScriptRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted behaviour for one generation call
pub struct StreamScript {
    chunks: Vec<String>,
    /// When set, the stream pauses after `chunks` until notified
    gate: Option<Arc<Notify>>,
    after_gate: Vec<String>,
    outcome: Result<(), LlmError>,
}

impl StreamScript {
    pub fn complete(chunks: &[&str]) -> Self {
        Self {
            chunks: to_strings(chunks),
            gate: None,
            after_gate: Vec::new(),
            outcome: Ok(()),
        }
    }

    pub fn failing(chunks: &[&str], error: LlmError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::complete(chunks)
        }
    }
}

fn to_strings(chunks: &[&str]) -> Vec<String> {
    chunks.iter().map(ToString::to_string).collect()
}

/// Mock generator that replays queued outcomes
pub struct MockGenerator {
    analyses: Mutex<VecDeque<Result<AnalysisResult, LlmError>>>,
    streams: Mutex<VecDeque<StreamScript>>,
    /// Record of all transcripts analysed
    pub transcripts: Mutex<Vec<String>>,
    /// Record of all generation requests
    pub stream_requests: Mutex<Vec<ScriptRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            analyses: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            transcripts: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_analysis(&self, outcome: Result<AnalysisResult, LlmError>) {
        self.analyses.lock().unwrap().push_back(outcome);
    }

    pub fn queue_stream(&self, script: StreamScript) {
        self.streams.lock().unwrap().push_back(script);
    }

    /// Queue a stream that emits `before`, waits for the returned gate,
    /// then emits `after` and completes
    pub fn queue_gated_stream(&self, before: &[&str], after: &[&str]) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.queue_stream(StreamScript {
            gate: Some(gate.clone()),
            after_gate: to_strings(after),
            ..StreamScript::complete(before)
        });
        gate
    }

    pub fn recorded_transcripts(&self) -> Vec<String> {
        self.transcripts.lock().unwrap().clone()
    }

    pub fn recorded_stream_requests(&self) -> Vec<ScriptRequest> {
        self.stream_requests.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptGenerator for MockGenerator {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, LlmError> {
        self.transcripts.lock().unwrap().push(transcript.to_string());
        self.analyses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::unknown("No mock analysis queued")))
    }

    async fn generate_script_stream(
        &self,
        request: &ScriptRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), LlmError> {
        self.stream_requests.lock().unwrap().push(request.clone());
        let script = self.streams.lock().unwrap().pop_front();
        let Some(script) = script else {
            return Err(LlmError::stream("No mock stream queued"));
        };

        for chunk in &script.chunks {
            on_chunk(chunk);
            tokio::task::yield_now().await;
        }
        if let Some(gate) = &script.gate {
            gate.notified().await;
            for chunk in &script.after_gate {
                on_chunk(chunk);
            }
        }

        script.outcome
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}
