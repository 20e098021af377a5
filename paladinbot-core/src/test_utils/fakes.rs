use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use parking_lot::Mutex;
use paladinbot_common::models::{ChannelInfo, LiveStream, TwitchUser};
use paladinbot_common::traits::api::{ChatSender, PlatformApi};
use crate::Error;

/// Captures every outbound chat line.
#[derive(Default)]
pub struct RecordingChatSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingChatSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// `(channel, text)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl ChatSender for RecordingChatSender {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Platform("simulated send failure".into()));
        }
        self.sent.lock().push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

/// Platform API answering from fixed data.
#[derive(Default)]
pub struct StaticPlatformApi {
    pub users: Vec<TwitchUser>,
    pub channel: Option<ChannelInfo>,
    pub streams: Vec<LiveStream>,
    token_refreshes: AtomicUsize,
    fail: AtomicBool,
}

impl StaticPlatformApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Vec<TwitchUser>) -> Self {
        self.users = users;
        self
    }

    pub fn with_channel(mut self, channel: ChannelInfo) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_streams(mut self, streams: Vec<LiveStream>) -> Self {
        self.streams = streams;
        self
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn token_refreshes(&self) -> usize {
        self.token_refreshes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Platform("simulated platform failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for StaticPlatformApi {
    async fn resolve_users(&self, logins: &[String]) -> Result<Vec<TwitchUser>, Error> {
        self.check()?;
        Ok(self
            .users
            .iter()
            .filter(|u| logins.iter().any(|l| l.eq_ignore_ascii_case(&u.login)))
            .cloned()
            .collect())
    }

    async fn get_channel_info(&self, broadcaster_id: &str) -> Result<Option<ChannelInfo>, Error> {
        self.check()?;
        Ok(self
            .channel
            .clone()
            .filter(|c| c.broadcaster_id == broadcaster_id))
    }

    async fn get_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, Error> {
        self.check()?;
        Ok(self
            .streams
            .iter()
            .filter(|s| logins.iter().any(|l| l.eq_ignore_ascii_case(&s.user_login)))
            .cloned()
            .collect())
    }

    async fn refresh_app_access_token(&self) -> Result<(), Error> {
        self.token_refreshes.fetch_add(1, Ordering::SeqCst);
        self.check()
    }
}
