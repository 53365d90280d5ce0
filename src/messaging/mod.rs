//! Event publication for recorded messages
//!
//! Every recorded message is published on the topic of its severity. The
//! ledger does not know who, if anyone, is listening: publication is
//! fire-and-forget and failures never reach the recording caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Publisher closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, MessagingError>;

/// Named topic a message notification is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    ErrorMessage,
    WarningMessage,
    InfoMessage,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ErrorMessage => "error-message",
            Topic::WarningMessage => "warning-message",
            Topic::InfoMessage => "info-message",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification carrying the recorded text as its sole payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerEvent {
    pub topic: Topic,
    pub text: String,
}

impl LedgerEvent {
    pub fn new(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            topic,
            text: text.into(),
        }
    }
}

/// Outbound publication seam for ledger notifications
///
/// Called synchronously from `Ledger::record`; implementations must not
/// block.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &LedgerEvent) -> Result<()>;
}

/// Publisher that drops every event (default when nothing subscribes)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl NoopPublisher {
    pub fn new() -> Self {
        Self
    }
}

impl EventPublisher for NoopPublisher {
    fn publish(&self, event: &LedgerEvent) -> Result<()> {
        tracing::trace!(topic = %event.topic, "Event dropped (no publisher)");
        Ok(())
    }
}

/// Broadcast-based publisher fanning events out to every subscriber
///
/// When the channel is full the oldest events are dropped; lagging
/// subscribers skip ahead instead of stalling the ledger.
#[derive(Debug)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<LedgerEvent>,
    published: AtomicU64,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Subscribe to events on every topic
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            topic: None,
        }
    }

    /// Subscribe to events on a single topic
    pub fn subscribe_topic(&self, topic: Topic) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            topic: Some(topic),
        }
    }

    pub fn total_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: &LedgerEvent) -> Result<()> {
        self.published.fetch_add(1, Ordering::Relaxed);
        // No active receivers is not a failure.
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(topic = %event.topic, "No subscribers for event");
        }
        Ok(())
    }
}

/// Receiving end of a [`BroadcastPublisher`] subscription
#[derive(Debug)]
pub struct EventSubscriber {
    receiver: broadcast::Receiver<LedgerEvent>,
    topic: Option<Topic>,
}

impl EventSubscriber {
    /// Next matching event; `None` once the publisher is gone
    pub async fn recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered
    pub fn try_recv(&mut self) -> Option<LedgerEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    fn matches(&self, event: &LedgerEvent) -> bool {
        self.topic.is_none_or(|topic| topic == event.topic)
    }
}
