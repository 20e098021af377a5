// ========================================================
// File: paladinbot-core/src/platforms/twitch_helix/requests.rs
// ========================================================
//! Helix response payloads and their conversion into shared models.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use paladinbot_common::models::{ChannelInfo, LiveStream, TwitchUser};

/// Every Helix list endpoint wraps its records in `data`.
#[derive(Debug, Deserialize)]
pub struct HelixList<T> {
    pub data: Vec<T>,
}

/// "Get Users" record.
#[derive(Debug, Deserialize)]
pub struct UserData {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserData> for TwitchUser {
    fn from(u: UserData) -> Self {
        TwitchUser {
            id: u.id,
            login: u.login,
            display_name: u.display_name,
            created_at: u.created_at,
        }
    }
}

/// "Get Channel Information" record.
#[derive(Debug, Deserialize)]
pub struct ChannelData {
    pub broadcaster_id: String,
    pub title: String,
    pub game_id: String,
    pub game_name: String,
}

impl From<ChannelData> for ChannelInfo {
    fn from(c: ChannelData) -> Self {
        ChannelInfo {
            broadcaster_id: c.broadcaster_id,
            title: c.title,
            category_id: c.game_id,
            category_name: c.game_name,
        }
    }
}

/// "Get Streams" record.
#[derive(Debug, Deserialize)]
pub struct StreamData {
    pub id: String,
    pub user_id: String,
    pub user_login: String,
    pub game_name: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
}

impl From<StreamData> for LiveStream {
    fn from(s: StreamData) -> Self {
        LiveStream {
            id: s.id,
            user_id: s.user_id,
            user_login: s.user_login,
            title: s.title,
            game_name: s.game_name,
            started_at: s.started_at,
        }
    }
}

/// Client-credentials token response from `id.twitch.tv`.
#[derive(Debug, Deserialize)]
pub struct AppTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}
