use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::db::models::Post;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Create,
    Update,
    Delete,
}

/// A post-change notification as delivered to subscribers:
/// `{"action": "...", "post": <payload>}`.
#[derive(Debug, Clone, Serialize)]
pub struct PostEvent {
    pub action: EventAction,
    /// Full post payload for create/update, the bare post id for delete.
    pub post: Value,
}

impl PostEvent {
    pub fn created(post: &Post) -> Self {
        Self {
            action: EventAction::Create,
            post: serde_json::to_value(post).unwrap_or(Value::Null),
        }
    }

    pub fn updated(post: &Post) -> Self {
        Self {
            action: EventAction::Update,
            post: serde_json::to_value(post).unwrap_or(Value::Null),
        }
    }

    pub fn deleted(post_id: &str) -> Self {
        Self {
            action: EventAction::Delete,
            post: Value::String(post_id.to_string()),
        }
    }
}

/// Fan-out hub for post-change events.
///
/// Delivery is best-effort and fire-and-forget: no acknowledgment, no retry,
/// no replay for subscribers that connect after an event fires.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<PostEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PostEvent> {
        self.tx.subscribe()
    }

    /// Publish to every currently connected subscriber. A send with zero
    /// receivers is not an error.
    pub fn publish(&self, event: PostEvent) {
        let subscribers = self.tx.receiver_count();
        if self.tx.send(event).is_ok() {
            tracing::debug!(subscribers, "published post event");
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
