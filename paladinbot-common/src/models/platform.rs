use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as returned by the platform API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Current channel metadata (title and category), independent of live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub broadcaster_id: String,
    pub title: String,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStream {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub title: String,
    pub game_name: String,
    pub started_at: DateTime<Utc>,
}
