//! src/eventbus/mod.rs
//!
//! In-process event bus with guaranteed delivery to every subscriber via
//! bounded MPSC queues. Also owns the process-wide shutdown flag.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use chrono::Utc;
use paladinbot_common::models::{ChatMessage, Chatter, SubscriptionNotice};

#[derive(Debug, Clone)]
pub enum BotEvent {
    /// One inbound chat line from the chat transport.
    ChatMessage(ChatMessage),
    /// A new or renewed subscription.
    Subscription(SubscriptionNotice),
}

impl BotEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BotEvent::ChatMessage(_) => "chat_message",
            BotEvent::Subscription(_) => "subscription",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<BotEvent>`.
///
/// - If the subscriber’s buffer fills, `publish` waits until there's space.
/// - If the subscriber has dropped its `Receiver`, sends to it are skipped.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<BotEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

const DEFAULT_BUFFER_SIZE: usize = 10000;

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<BotEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all live subscribers. Closed subscribers are
    /// dropped from the list.
    pub async fn publish(&self, event: BotEvent) {
        let senders = {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }

    /// Convenience method: publish a `ChatMessage` event stamped with now.
    pub async fn publish_chat(&self, channel: &str, chatter: Chatter, text: &str) {
        let event = BotEvent::ChatMessage(ChatMessage {
            channel: channel.to_string(),
            chatter,
            text: text.to_string(),
            received_at: Utc::now(),
        });
        self.publish(event).await;
    }
}
