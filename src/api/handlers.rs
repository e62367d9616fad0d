//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{AcceptedResponse, ErrorResponse, TopicRequest, TranscriptRequest};
use super::AppState;
use crate::runtime::{CommandError, SessionSnapshot};
use crate::state_machine::TransitionError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Current session
        .route("/api/session", get(get_session))
        // SSE streaming
        .route("/api/session/stream", get(stream_session))
        // User commands
        .route("/api/session/transcript", post(submit_transcript))
        .route("/api/session/topic", post(submit_topic))
        .route("/api/session/reset", post(reset_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn get_session(State(state): State<AppState>) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.session.snapshot().await?))
}

async fn stream_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (snapshot, rx) = state.session.subscribe().await?;
    Ok(sse_stream(snapshot, rx))
}

async fn submit_transcript(
    State(state): State<AppState>,
    Json(req): Json<TranscriptRequest>,
) -> Result<Json<AcceptedResponse>, AppError> {
    state.session.submit_transcript(req.text).await?;
    Ok(Json(AcceptedResponse::yes()))
}

async fn submit_topic(
    State(state): State<AppState>,
    Json(req): Json<TopicRequest>,
) -> Result<Json<AcceptedResponse>, AppError> {
    state.session.submit_topic(req.topic).await?;
    Ok(Json(AcceptedResponse::yes()))
}

async fn reset_session(State(state): State<AppState>) -> Result<Json<AcceptedResponse>, AppError> {
    state.session.reset().await?;
    Ok(Json(AcceptedResponse::yes()))
}

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<CommandError> for AppError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Rejected(TransitionError::EmptyInput(_)) => {
                AppError::BadRequest(e.to_string())
            }
            CommandError::Rejected(
                TransitionError::Busy
                | TransitionError::NoAnalysis
                | TransitionError::ResetRequired,
            ) => AppError::Conflict(e.to_string()),
            CommandError::RuntimeGone => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
