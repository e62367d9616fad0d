//! Google Gemini provider implementation

use super::prompts::{analysis_prompt, generation_prompt};
use super::sse::SseDecoder;
use super::types::{AnalysisResult, ScriptRequest};
use super::{LlmError, ScriptGenerator};
use crate::config::LlmConfig;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

const ANALYSIS_TEMPERATURE: f32 = 0.7;
const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_TOP_P: f32 = 0.8;
const GENERATION_TOP_K: i32 = 40;

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model_id: String,
    language: String,
}

impl GeminiService {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model_id: config.model.clone(),
            language: config.language.clone(),
        })
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or_else(|| {
            LlmError::configuration("API key is missing. Set GEMINI_API_KEY in the environment.")
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model_id, method)
    }

    async fn post(
        &self,
        url: &str,
        api_key: &str,
        body: &GeminiRequest,
    ) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(LlmError::from_status(status.as_u16(), &message))
    }
}

#[async_trait]
impl ScriptGenerator for GeminiService {
    async fn analyze(&self, transcript: &str) -> Result<AnalysisResult, LlmError> {
        let api_key = self.api_key()?;

        let request = GeminiRequest::user_text(
            analysis_prompt(transcript, &self.language),
            GeminiGenerationConfig {
                temperature: Some(ANALYSIS_TEMPERATURE),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(analysis_schema()),
                ..GeminiGenerationConfig::default()
            },
        );

        let response = self
            .post(&self.endpoint("generateContent"), api_key, &request)
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::parse(format!("Failed to parse response: {e}")))?;

        let text = gemini_response.text();
        if text.trim().is_empty() {
            return Err(LlmError::empty_response(match gemini_response.block_reason() {
                Some(reason) => format!("No analysis returned (blocked: {reason})"),
                None => "No analysis returned".to_string(),
            }));
        }

        AnalysisResult::from_json(&text)
    }

    async fn generate_script_stream(
        &self,
        request: &ScriptRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<(), LlmError> {
        let api_key = self.api_key()?;

        let gemini_request = GeminiRequest::user_text(
            generation_prompt(request, &self.language),
            GeminiGenerationConfig {
                temperature: Some(GENERATION_TEMPERATURE),
                top_p: Some(GENERATION_TOP_P),
                top_k: Some(GENERATION_TOP_K),
                ..GeminiGenerationConfig::default()
            },
        );

        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self
            .post(&url, api_key, &gemini_request)
            .await
            .map_err(LlmError::into_stream_error)?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(read) = body.next().await {
            let bytes = read.map_err(|e| LlmError::stream(format!("Stream interrupted: {e}")))?;
            for data in decoder.push(&bytes) {
                deliver_frame(&data, on_chunk)?;
            }
        }
        if let Some(data) = decoder.finish() {
            deliver_frame(&data, on_chunk)?;
        }

        Ok(())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Decode one SSE frame and hand its text to the callback if there is any
fn deliver_frame(
    data: &str,
    on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
) -> Result<(), LlmError> {
    let frame: GeminiResponse = serde_json::from_str(data)
        .map_err(|e| LlmError::stream(format!("Undecodable stream frame: {e}")))?;

    if let Some(error) = frame.error {
        return Err(LlmError::stream(format!("Remote error: {}", error.message)));
    }

    let text = frame.text();
    if !text.is_empty() {
        on_chunk(&text);
    }
    Ok(())
}

/// Output contract for the analysis call
fn analysis_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "structureSummary": {
                "type": "STRING",
                "description": "Structural summary of why the source video succeeded"
            },
            "suggestedTopics": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Three recommended topics that fit this structure"
            }
        },
        "required": ["structureSummary", "suggestedTopics"]
    })
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiRequestContent>,
    generation_config: GeminiGenerationConfig,
}

impl GeminiRequest {
    fn user_text(text: String, generation_config: GeminiGenerationConfig) -> Self {
        Self {
            contents: vec![GeminiRequestContent {
                role: "user",
                parts: vec![GeminiRequestPart { text }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequestContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

/// Full response and streamed frame share this shape
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(default)]
    error: Option<GeminiError>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, skipping thought parts
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
