use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Someone who sent a chat line, as identified by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatter {
    /// Platform-stable numeric user id.
    pub id: i64,
    /// Lowercase login name.
    pub login: String,
    pub display_name: String,
    /// Raw badge names (`broadcaster`, `moderator`, `subscriber`, ...).
    pub badges: Vec<String>,
}

impl Chatter {
    pub fn new(id: i64, login: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            display_name: display_name.into(),
            badges: Vec::new(),
        }
    }

    pub fn with_badges<I, S>(mut self, badges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.badges = badges.into_iter().map(Into::into).collect();
        self
    }
}

/// One inbound chat line.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Channel name without the leading `#`.
    pub channel: String,
    pub chatter: Chatter,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// A subscription announced by the chat transport (`USERNOTICE` with
/// `msg-id` `sub` or `resub`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionNotice {
    /// Channel name without the leading `#`.
    pub channel: String,
    pub login: String,
    /// `sub` or `resub`.
    pub kind: String,
    /// The platform's own human-readable summary, e.g.
    /// `Alice subscribed for 3 months!`.
    pub system_msg: String,
}
