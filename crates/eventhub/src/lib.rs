use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sentinel_common::RequestId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The families of events subscribers can filter on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PiiDetection,
    VectorSecurity,
    SystemStatus,
    Connection,
    RequestCompletion,
}

/// A single detection or lifecycle event broadcast to live subscribers.
/// `data` carries the already-scrubbed payload — nothing sensitive ever
/// reaches this envelope.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(kind: EventKind, request_id: Option<RequestId>, data: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            request_id,
            data,
        }
    }
}

struct Subscriber {
    id: u64,
    filter: HashSet<EventKind>,
    sender: mpsc::Sender<Event>,
}

/// Central broadcast hub. Each subscriber gets its own bounded channel;
/// a slow subscriber that fills its queue is dropped rather than
/// allowed to stall publishers, matching the hub's job of keeping the
/// request path independent of anyone watching it.
#[derive(Default)]
pub struct EventHub {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new subscriber filtered to `kinds` (empty means "all
    /// kinds"). Returns the receiving half and an id usable to unsubscribe.
    pub fn subscribe(&self, kinds: HashSet<EventKind>, queue_size: usize) -> (u64, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("event hub mutex poisoned")
            .push(Subscriber {
                id,
                filter: kinds,
                sender: tx,
            });
        (id, rx)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers
            .lock()
            .expect("event hub mutex poisoned")
            .retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("event hub mutex poisoned").len()
    }

    /// Publish an event to every subscriber whose filter matches. Never
    /// awaits: subscribers that can't keep up are dropped immediately,
    /// not blocked on.
    pub fn publish(&self, event: Event) {
        let mut subscribers = self.subscribers.lock().expect("event hub mutex poisoned");
        subscribers.retain(|sub| {
            if !sub.filter.is_empty() && !sub.filter.contains(&event.kind) {
                return true;
            }
            match sub.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber_id = sub.id, "event subscriber queue full, dropping");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn filtered_subscriber_only_receives_matching_kinds() {
        let hub = EventHub::new();
        let mut filter = HashSet::new();
        filter.insert(EventKind::PiiDetection);
        let (_id, mut rx) = hub.subscribe(filter, 8);

        hub.publish(Event::new(EventKind::SystemStatus, None, json!({})));
        hub.publish(Event::new(EventKind::PiiDetection, None, json!({"hit": true})));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, EventKind::PiiDetection);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unfiltered_subscriber_receives_everything() {
        let hub = EventHub::new();
        let (_id, mut rx) = hub.subscribe(HashSet::new(), 8);
        hub.publish(Event::new(EventKind::Connection, None, json!({})));
        hub.publish(Event::new(EventKind::PiiDetection, None, json!({})));
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn full_queue_drops_the_subscriber_not_the_publisher() {
        let hub = EventHub::new();
        let (_id, rx) = hub.subscribe(HashSet::new(), 1);
        hub.publish(Event::new(EventKind::Connection, None, json!({})));
        hub.publish(Event::new(EventKind::Connection, None, json!({})));
        assert_eq!(hub.subscriber_count(), 0);
        drop(rx);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let hub = EventHub::new();
        let (id, mut rx) = hub.subscribe(HashSet::new(), 8);
        hub.unsubscribe(id);
        hub.publish(Event::new(EventKind::Connection, None, json!({})));
        assert!(rx.try_recv().is_err());
    }
}
