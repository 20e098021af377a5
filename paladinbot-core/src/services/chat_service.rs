//! Glue between the chat transport and the dispatcher.

use std::sync::Arc;
use std::time::Duration;
use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use paladinbot_common::models::{ChatMessage, SubscriptionNotice};
use paladinbot_common::traits::api::ChatSender;
use paladinbot_common::traits::repository_traits::ChatterRepository;
use crate::eventbus::{BotEvent, EventBus};
use crate::services::dispatcher::{CommandDispatcher, DispatchOutcome};

/// One of these closes every subscription announcement.
pub const SUB_HYPE_EMOTES: &[&str] = &["Pog", "PogU", "POGGERS", "PagChomp", "PagMan", "PagBounce"];

pub struct ChatService {
    dispatcher: Arc<CommandDispatcher>,
    sender: Arc<dyn ChatSender>,
    chatter_repo: Arc<dyn ChatterRepository>,
    tracker: TaskTracker,
}

impl ChatService {
    pub fn new(
        dispatcher: Arc<CommandDispatcher>,
        sender: Arc<dyn ChatSender>,
        chatter_repo: Arc<dyn ChatterRepository>,
    ) -> Self {
        Self {
            dispatcher,
            sender,
            chatter_repo,
            tracker: TaskTracker::new(),
        }
    }

    /// Subscribes to chat events and hands each line to its own task. The
    /// loop itself never waits on a dispatch.
    pub async fn start(self: Arc<Self>, event_bus: &EventBus) -> JoinHandle<()> {
        let mut rx = event_bus.subscribe(None).await;
        let mut shutdown_rx = event_bus.shutdown_rx.clone();

        tokio::spawn(async move {
            info!("ChatService started");
            loop {
                tokio::select! {
                    maybe_event = rx.recv() => {
                        let Some(event) = maybe_event else {
                            debug!("event bus closed");
                            break;
                        };
                        match event {
                            BotEvent::ChatMessage(msg) => {
                                let svc = self.clone();
                                self.tracker.spawn(async move {
                                    svc.handle_message(msg).await;
                                });
                            }
                            BotEvent::Subscription(notice) => {
                                let svc = self.clone();
                                self.tracker.spawn(async move {
                                    svc.announce_subscription(&notice).await;
                                });
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("ChatService stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Records the chatter, dispatches the line and sends any reply.
    pub async fn handle_message(&self, msg: ChatMessage) -> DispatchOutcome {
        if let Err(e) = self.chatter_repo.upsert_chatter(&msg.chatter, msg.received_at).await {
            warn!(user = %msg.chatter.login, "failed to record chatter: {}", e);
        }

        let outcome = self
            .dispatcher
            .dispatch(&msg.channel, &msg.chatter, &msg.text)
            .await;

        if let Some(reply) = outcome.reply_text() {
            if let Err(e) = self.sender.send_message(&msg.channel, reply).await {
                error!(channel = %msg.channel, "failed to send reply: {}", e);
            }
        }
        outcome
    }

    /// Thanks a subscriber in chat, addressed to the broadcaster. Returns
    /// the line that was sent.
    pub async fn announce_subscription(&self, notice: &SubscriptionNotice) -> Option<String> {
        let emote = SUB_HYPE_EMOTES.choose(&mut rand::rng()).copied().unwrap_or("PogU");
        let text = format!("@{}, {} {}", notice.channel, notice.system_msg, emote);
        match self.sender.send_message(&notice.channel, &text).await {
            Ok(()) => {
                info!(user = %notice.login, kind = %notice.kind, "subscription announced");
                Some(text)
            }
            Err(e) => {
                error!(channel = %notice.channel, "failed to announce subscription: {}", e);
                None
            }
        }
    }

    /// Number of dispatches still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting new dispatch tasks and waits for the running ones.
    /// Returns `false` if they did not finish within `grace`.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!("{} dispatches still running after {:?}", self.tracker.len(), grace);
                false
            }
        }
    }
}
