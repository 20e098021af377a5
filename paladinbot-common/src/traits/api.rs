use async_trait::async_trait;
use crate::error::Error;
use crate::models::{ChannelInfo, LiveStream, TwitchUser};

/// Query surface of the streaming platform's HTTP API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Looks up users by login name. Unknown logins are simply absent from
    /// the result.
    async fn resolve_users(&self, logins: &[String]) -> Result<Vec<TwitchUser>, Error>;

    async fn get_channel_info(&self, broadcaster_id: &str) -> Result<Option<ChannelInfo>, Error>;

    /// Live streams for the given logins; offline channels are absent.
    async fn get_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, Error>;

    /// Re-acquires the application access token.
    async fn refresh_app_access_token(&self) -> Result<(), Error>;
}

/// Outbound half of the chat transport.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error>;
}
