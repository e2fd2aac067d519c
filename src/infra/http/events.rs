//! Server-sent events for connected dashboard viewers.
//!
//! The stream is best-effort: a lagging receiver skips ahead and a client
//! that misses events self-heals on its next dashboard fetch. The admin
//! credential is enforced by the router middleware before the handshake
//! reaches this handler.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::application::notify::PushEvent;

use super::{AppState, error::ApiError};

pub async fn subscribe(State(state): State<AppState>) -> Response {
    let Some(notifier) = state.realtime.clone() else {
        return ApiError::not_found("Real-time channel is disabled").into_response();
    };

    let mut receiver = notifier.subscribe();
    debug!(
        target = "vetrina::http::events",
        subscribers = notifier.receiver_count(),
        "dashboard viewer connected"
    );

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => yield Ok::<_, Infallible>(wire_event(event)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        target = "vetrina::http::events",
                        skipped,
                        "viewer lagged behind the push channel"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

fn wire_event(event: PushEvent) -> Event {
    let timestamp = event
        .emitted_at
        .format(&Rfc3339)
        .unwrap_or_default();
    let payload = json!({
        "payload": event.payload,
        "timestamp": timestamp,
    });

    Event::default().event(event.name).data(payload.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::notify::{DataSet, PushEvent};

    #[test]
    fn wire_event_carries_name_and_timestamped_payload() {
        let push = PushEvent::data_update(DataSet::Quotes, json!({"id": "q1"}));
        // Event fields are write-only; round-trip through the debug form.
        let rendered = format!("{:?}", wire_event(push));
        assert!(rendered.contains("data:quotes:update"));
        assert!(rendered.contains("timestamp"));
    }
}
