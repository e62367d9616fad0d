//! Server-Sent Events support

use crate::runtime::{SessionSnapshot, SseEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    snapshot: SessionSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move {
        Ok(sse_event_to_axum(SseEvent::Init { snapshot }))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(event))),
        Err(e) => {
            // Lagged: the client should re-fetch the snapshot
            tracing::warn!(error = %e, "SSE subscriber lagged");
            Some(Ok(lagged_event()))
        }
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "session": snapshot
            }),
        ),
        SseEvent::StateChange { snapshot } => (
            "state_change",
            json!({
                "type": "state_change",
                "session": snapshot
            }),
        ),
        SseEvent::Chunk { text } => (
            "chunk",
            json!({
                "type": "chunk",
                "text": text
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}

fn lagged_event() -> Event {
    let data = json!({
        "type": "error",
        "message": "Missed updates, reload the session"
    });
    Event::default().event("error").data(data.to_string())
}
