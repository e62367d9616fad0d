//! Session runtime executor

use super::{Command, RuntimeMessage, SessionSnapshot, SseEvent};
use crate::llm::{ScriptGenerator, ScriptRequest};
use crate::state_machine::{transition, AttemptId, Effect, Event, SessionState, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

const BROADCAST_CAPACITY: usize = 256;

/// Owns the session state and executes the effects of each transition
pub struct SessionRuntime<G: ScriptGenerator + 'static> {
    state: SessionState,
    generator: Arc<G>,
    rx: mpsc::UnboundedReceiver<RuntimeMessage>,
    /// Weak so the runtime stops once every handle and in-flight call is gone
    outcome_tx: mpsc::WeakUnboundedSender<RuntimeMessage>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    last_attempt: AttemptId,
}

impl<G: ScriptGenerator + 'static> SessionRuntime<G> {
    pub fn new(
        generator: Arc<G>,
        rx: mpsc::UnboundedReceiver<RuntimeMessage>,
        tx: &mpsc::UnboundedSender<RuntimeMessage>,
    ) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            state: SessionState::Idle,
            generator,
            rx,
            outcome_tx: tx.downgrade(),
            broadcast_tx,
            last_attempt: 0,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(model = %self.generator.model_id(), "Starting session runtime");

        while let Some(message) = self.rx.recv().await {
            match message {
                RuntimeMessage::Command { command, reply } => {
                    let event = self.command_to_event(command);
                    let name = event.name();
                    let result = self.apply(event);
                    if let Err(e) = &result {
                        tracing::info!(
                            command = name,
                            state = self.state.kind().as_str(),
                            busy = self.state.is_busy(),
                            reason = %e,
                            "Command rejected"
                        );
                    }
                    // The caller may have gone away; the command still stands
                    let _ = reply.send(result);
                }
                RuntimeMessage::Outcome(event) => {
                    debug_assert!(!event.is_user_command());
                    // Outcomes are never refused, stale ones just change nothing
                    if let Err(e) = self.apply(event) {
                        tracing::error!(error = %e, "Remote outcome rejected");
                    }
                }
                RuntimeMessage::Snapshot { reply } => {
                    let _ = reply.send(SessionSnapshot::from(&self.state));
                }
                RuntimeMessage::Subscribe { reply } => {
                    let snapshot = SessionSnapshot::from(&self.state);
                    let _ = reply.send((snapshot, self.broadcast_tx.subscribe()));
                }
            }
        }

        tracing::info!("Session runtime stopped");
    }

    /// Turn a user command into an event, assigning a fresh attempt id to
    /// anything that may start a remote call
    fn command_to_event(&mut self, command: Command) -> Event {
        match command {
            Command::SubmitTranscript(text) => Event::SubmitTranscript {
                text,
                attempt: self.next_attempt(),
            },
            Command::SubmitTopic(topic) => Event::SubmitTopic {
                topic,
                attempt: self.next_attempt(),
            },
            Command::Reset => Event::Reset,
        }
    }

    fn next_attempt(&mut self) -> AttemptId {
        self.last_attempt += 1;
        self.last_attempt
    }

    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        // Fragments are appended in place; the outcome matches `transition`
        let event = match event {
            Event::ChunkReceived { attempt, text } => {
                if self.state.append_chunk(attempt, &text) {
                    self.execute_effect(Effect::NotifyChunk { text });
                } else {
                    tracing::debug!(
                        attempt,
                        in_flight = ?self.state.in_flight_attempt(),
                        "Ignored stale chunk"
                    );
                }
                return Ok(());
            }
            other => other,
        };

        let name = event.name();
        let result = transition(&self.state, event)?;

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state.kind() != self.state.kind() {
            tracing::info!(
                event = name,
                from = old_state.kind().as_str(),
                to = self.state.kind().as_str(),
                "Session state changed"
            );
            if let SessionState::Error {
                message,
                error_kind,
                ..
            } = &self.state
            {
                tracing::warn!(
                    kind = ?error_kind,
                    needs_user_action = error_kind.needs_user_action(),
                    error = %message,
                    "Session failed"
                );
            }
        } else if result.effects.is_empty() {
            tracing::debug!(
                event = name,
                state = self.state.kind().as_str(),
                in_flight = ?self.state.in_flight_attempt(),
                "Ignored stale outcome"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::NotifyStateChange { state } => {
                tracing::debug!(state = state.as_str(), "Broadcasting state change");
                // No subscribers is fine
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    snapshot: SessionSnapshot::from(&self.state),
                });
            }
            Effect::NotifyChunk { text } => {
                let _ = self.broadcast_tx.send(SseEvent::Chunk { text });
            }
            Effect::RequestAnalysis {
                attempt,
                transcript,
            } => self.spawn_analysis(attempt, transcript),
            Effect::RequestGeneration { attempt, request } => {
                self.spawn_generation(attempt, request);
            }
        }
    }

    fn spawn_analysis(&self, attempt: AttemptId, transcript: String) {
        let Some(tx) = self.outcome_tx.upgrade() else {
            return;
        };
        let generator = self.generator.clone();

        tokio::spawn(async move {
            tracing::info!(attempt, "Making analysis request (background)");
            let event = match generator.analyze(&transcript).await {
                Ok(result) => Event::AnalysisSucceeded { attempt, result },
                Err(error) => Event::AnalysisFailed { attempt, error },
            };
            let _ = tx.send(RuntimeMessage::Outcome(event));
        });
    }

    fn spawn_generation(&self, attempt: AttemptId, request: ScriptRequest) {
        let Some(tx) = self.outcome_tx.upgrade() else {
            return;
        };
        let generator = self.generator.clone();

        tokio::spawn(async move {
            tracing::info!(
                attempt,
                topic = %request.topic,
                "Making generation request (background)"
            );

            let chunk_tx = tx.clone();
            let mut on_chunk = |text: &str| {
                let _ = chunk_tx.send(RuntimeMessage::Outcome(Event::ChunkReceived {
                    attempt,
                    text: text.to_string(),
                }));
            };

            let event = match generator.generate_script_stream(&request, &mut on_chunk).await {
                Ok(()) => Event::StreamCompleted { attempt },
                Err(error) => Event::StreamFailed { attempt, error },
            };
            let _ = tx.send(RuntimeMessage::Outcome(event));
        });
    }
}
