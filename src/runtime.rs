//! Runtime for executing the session
//!
//! A single task owns the [`SessionState`]; everything else talks to it
//! through a [`SessionHandle`].

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::llm::{AnalysisResult, LlmErrorKind, ScriptGenerator};
use crate::state_machine::{SessionState, SessionStateKind, TransitionError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Everything a client needs to render the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionStateKind,
    pub transcript: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub topic: Option<String>,
    pub output: String,
    pub error: Option<String>,
    pub error_kind: Option<LlmErrorKind>,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        let error_kind = match state {
            SessionState::Error { error_kind, .. } => Some(*error_kind),
            _ => None,
        };
        Self {
            state: state.kind(),
            transcript: state.transcript().map(ToString::to_string),
            analysis: state.analysis().cloned(),
            topic: state.topic().map(ToString::to_string),
            output: state.output().to_string(),
            error: state.error_message().map(ToString::to_string),
            error_kind,
        }
    }
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { snapshot: SessionSnapshot },
    StateChange { snapshot: SessionSnapshot },
    Chunk { text: String },
}

/// Commands exposed to the presentation layer
#[derive(Debug, Clone)]
pub enum Command {
    SubmitTranscript(String),
    SubmitTopic(String),
    Reset,
}

/// Messages drained by the runtime task
pub enum RuntimeMessage {
    /// User command, answered once applied or refused
    Command {
        command: Command,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    /// Outcome of a remote call
    Outcome(crate::state_machine::Event),
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Current snapshot plus a receiver for everything after it
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SseEvent>)>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session runtime is not running")]
    RuntimeGone,
}

/// Handle to interact with the running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<RuntimeMessage>,
}

impl SessionHandle {
    /// Spawn the runtime task and return a handle to it
    pub fn start<G: ScriptGenerator + 'static>(generator: Arc<G>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = SessionRuntime::new(generator, rx, &tx);

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!("Session runtime finished");
        });

        Self { tx }
    }

    pub async fn submit_transcript(&self, text: impl Into<String>) -> Result<(), CommandError> {
        self.send(Command::SubmitTranscript(text.into())).await
    }

    pub async fn submit_topic(&self, topic: impl Into<String>) -> Result<(), CommandError> {
        self.send(Command::SubmitTopic(topic.into())).await
    }

    pub async fn reset(&self) -> Result<(), CommandError> {
        self.send(Command::Reset).await
    }

    /// Current state without subscribing
    pub async fn snapshot(&self) -> Result<SessionSnapshot, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::Snapshot { reply })
            .map_err(|_| CommandError::RuntimeGone)?;
        rx.await.map_err(|_| CommandError::RuntimeGone)
    }

    /// Snapshot and event receiver taken atomically, so no chunk is missed
    /// or seen twice between the two
    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), CommandError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::Subscribe { reply })
            .map_err(|_| CommandError::RuntimeGone)?;
        rx.await.map_err(|_| CommandError::RuntimeGone)
    }

    async fn send(&self, command: Command) -> Result<(), CommandError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RuntimeMessage::Command { command, reply })
            .map_err(|_| CommandError::RuntimeGone)?;
        rx.await.map_err(|_| CommandError::RuntimeGone)??;
        Ok(())
    }
}
