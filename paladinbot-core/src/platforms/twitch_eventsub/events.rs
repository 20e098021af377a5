use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Outer body of every webhook request.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSubEnvelope {
    pub subscription: Subscription,
    /// Present only on `webhook_callback_verification`.
    #[serde(default)]
    pub challenge: Option<String>,
    /// Present only on `notification`.
    #[serde(default)]
    pub event: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub r#type: String,
    #[serde(default)]
    pub status: String,
}

/// "stream.online" payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOnline {
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    #[serde(default)]
    pub r#type: String,
    pub started_at: DateTime<Utc>,
}

/// "stream.offline" payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOffline {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
}

/// "channel.update" payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelUpdate {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub title: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
}
