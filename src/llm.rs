//! Generative service client
//!
//! Two remote operations: a structured analysis of a transcript, and a
//! streamed script generation that reuses the analysed structure.

mod error;
mod gemini;
mod prompts;
mod sse;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::{AnalysisResult, ScriptRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the generative service
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Summarize why the transcript works and propose new topics
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, LlmError>;

    /// Stream a new script for `request.topic`.
    ///
    /// Every non-empty fragment is passed to `on_chunk` in arrival order
    /// before the next one is read. Fragments already delivered are never
    /// retracted, even when the call later fails.
    async fn generate_script_stream(
        &self,
        request: &ScriptRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ScriptGenerator + ?Sized> ScriptGenerator for Arc<T> {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, LlmError> {
        (**self).analyze(transcript).await
    }

    async fn generate_script_stream(
        &self,
        request: &ScriptRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), LlmError> {
        (**self).generate_script_stream(request, on_chunk).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for generative services
pub struct LoggingService {
    inner: Arc<dyn ScriptGenerator>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ScriptGenerator>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ScriptGenerator for LoggingService {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.analyze(transcript).await;
        let duration = start.elapsed();

        match &result {
            Ok(analysis) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    transcript_chars = transcript.chars().count(),
                    topics = analysis.suggested_topics.len(),
                    "Analysis request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Analysis request failed"
                );
            }
        }

        result
    }

    async fn generate_script_stream(
        &self,
        request: &ScriptRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), LlmError> {
        let start = std::time::Instant::now();
        let mut chunks = 0usize;
        let mut chars = 0usize;
        let mut counting = |text: &str| {
            chunks += 1;
            chars += text.chars().count();
            on_chunk(text);
        };
        let result = self
            .inner
            .generate_script_stream(request, &mut counting)
            .await;
        let duration = start.elapsed();

        match &result {
            Ok(()) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    topic = %request.topic,
                    chunks,
                    chars,
                    "Script stream completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    topic = %request.topic,
                    chunks,
                    error = %e.message,
                    kind = ?e.kind,
                    "Script stream failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
