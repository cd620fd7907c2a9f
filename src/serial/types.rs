//! Delivery contract between the link core and whatever renders it
use std::sync::{Arc, RwLock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Consumer of decoded device text and status lines.
///
/// Callbacks run on the reader task (or on a delayed reply task) and must
/// return quickly.
pub trait Observer: Send + Sync {
    fn on_text(&self, text: &str);
    fn on_status(&self, message: &str);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkEvent {
    Text { text: String, at: DateTime<Utc> },
    Status { message: String, at: DateTime<Utc> },
}

impl LinkEvent {
    pub fn text(text: &str) -> Self {
        LinkEvent::Text { text: text.to_string(), at: Utc::now() }
    }

    pub fn status(message: &str) -> Self {
        LinkEvent::Status { message: message.to_string(), at: Utc::now() }
    }
}

/// Observer that republishes everything on a broadcast channel
#[derive(Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<LinkEvent>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }
}

impl Observer for EventChannel {
    fn on_text(&self, text: &str) {
        // No subscribers is fine
        let _ = self.tx.send(LinkEvent::text(text));
    }

    fn on_status(&self, message: &str) {
        let _ = self.tx.send(LinkEvent::status(message));
    }
}

/// Flat, shareable list of observers.
#[derive(Clone, Default)]
pub struct ObserverSet {
    inner: Arc<RwLock<Vec<Arc<dyn Observer>>>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<dyn Observer>) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.push(observer);
    }

    pub fn text(&self, text: &str) {
        for observer in self.snapshot() {
            observer.on_text(text);
        }
    }

    pub fn status(&self, message: &str) {
        for observer in self.snapshot() {
            observer.on_status(message);
        }
    }

    // Callbacks run without the lock held so an observer may register another.
    fn snapshot(&self) -> Vec<Arc<dyn Observer>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
