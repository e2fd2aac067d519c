//! Push notification seam for connected dashboard viewers.
//!
//! The push channel is strictly additive: services call
//! [`Notifier::broadcast`] unconditionally and the no-op implementation
//! absorbs it when real-time delivery is disabled. Polling the read endpoint
//! remains the correctness path; a missed event is self-healed by the next
//! fetch.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::debug;

/// Named data sets viewers can observe for change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSet {
    Activities,
    Quotes,
    Users,
    Newsletter,
    Forms,
}

impl DataSet {
    pub fn as_str(self) -> &'static str {
        match self {
            DataSet::Activities => "activities",
            DataSet::Quotes => "quotes",
            DataSet::Users => "users",
            DataSet::Newsletter => "newsletter",
            DataSet::Forms => "forms",
        }
    }
}

/// A fan-out event with no delivery guarantee.
#[derive(Debug, Clone, Serialize)]
pub struct PushEvent {
    /// SSE event name, e.g. `data:forms:update` or `activity:event`.
    pub name: String,
    pub payload: JsonValue,
    #[serde(with = "time::serde::rfc3339")]
    pub emitted_at: OffsetDateTime,
}

impl PushEvent {
    pub fn data_update(data_set: DataSet, payload: JsonValue) -> Self {
        Self {
            name: format!("data:{}:update", data_set.as_str()),
            payload,
            emitted_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn activity(payload: JsonValue) -> Self {
        Self {
            name: "activity:event".to_string(),
            payload,
            emitted_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn notification(payload: JsonValue) -> Self {
        Self {
            name: "notification".to_string(),
            payload,
            emitted_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Capability interface for the optional real-time layer.
pub trait Notifier: Send + Sync {
    fn broadcast(&self, event: PushEvent);
}

/// Default when real-time delivery is disabled. Absorbs every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn broadcast(&self, _event: PushEvent) {}
}

/// Fan-out over a tokio broadcast channel. Lagging or disconnected receivers
/// simply miss events.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<PushEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn broadcast(&self, event: PushEvent) {
        // Err means no subscriber is connected right now; that is fine.
        if let Err(err) = self.sender.send(event) {
            debug!(
                target = "vetrina::notify",
                event = %err.0.name,
                "no subscribers for push event"
            );
        }
    }
}

/// Shared handle services hold; defaults to the no-op implementation.
pub type SharedNotifier = Arc<dyn Notifier>;

pub fn noop_notifier() -> SharedNotifier {
    Arc::new(NoopNotifier)
}
