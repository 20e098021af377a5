use std::sync::Arc;
use chrono::{DateTime, Utc};
use paladinbot_common::models::{Chatter, CustomCommand, StreamMetadata, StreamStatus};
use paladinbot_common::traits::api::PlatformApi;
use crate::Error;
use crate::services::builtin_commands::{default_commands, BuiltinCommand};
use crate::services::{CommandDispatcher, CommandRegistry, CooldownTracker, StreamStateCache};
use crate::settings::BotSettings;
use crate::web::WebState;
use super::fakes::{RecordingChatSender, StaticPlatformApi};
use super::memory::{
    MemoryBuiltinCommandRepository, MemoryChatterRepository, MemoryCustomCommandRepository,
    MemoryStreamStatusRepository,
};

pub const TEST_CHANNEL: &str = "testchannel";

/// A fully wired engine over in-memory stores.
pub struct BotFixture {
    pub settings: Arc<BotSettings>,
    pub builtin_repo: Arc<MemoryBuiltinCommandRepository>,
    pub custom_repo: Arc<MemoryCustomCommandRepository>,
    pub chatter_repo: Arc<MemoryChatterRepository>,
    pub stream_repo: Arc<MemoryStreamStatusRepository>,
    pub platform_api: Arc<dyn PlatformApi>,
    pub registry: Arc<CommandRegistry>,
    pub cooldowns: Arc<CooldownTracker>,
    pub stream_state: Arc<StreamStateCache>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub sender: Arc<RecordingChatSender>,
}

pub struct BotFixtureBuilder {
    settings: BotSettings,
    builtins: Vec<Arc<dyn BuiltinCommand>>,
    custom: Vec<CustomCommand>,
    platform_api: Arc<dyn PlatformApi>,
}

impl BotFixtureBuilder {
    pub fn settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn builtins(mut self, builtins: Vec<Arc<dyn BuiltinCommand>>) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn custom(mut self, custom: Vec<CustomCommand>) -> Self {
        self.custom = custom;
        self
    }

    pub fn platform_api(mut self, api: Arc<dyn PlatformApi>) -> Self {
        self.platform_api = api;
        self
    }

    pub async fn build(self) -> Result<BotFixture, Error> {
        let settings = Arc::new(self.settings);
        let builtin_repo = Arc::new(MemoryBuiltinCommandRepository::new());
        let custom_repo = Arc::new(MemoryCustomCommandRepository::with_commands(self.custom));
        let chatter_repo = Arc::new(MemoryChatterRepository::new());
        let stream_repo = Arc::new(MemoryStreamStatusRepository::new());

        let registry = Arc::new(CommandRegistry::new(
            settings.prefix.clone(),
            self.builtins,
            builtin_repo.clone(),
            custom_repo.clone(),
        )?);
        registry.load_custom().await?;

        let cooldowns = Arc::new(CooldownTracker::new());
        let stream_state = Arc::new(StreamStateCache::new(stream_repo.clone()));
        let dispatcher = Arc::new(CommandDispatcher::new(
            settings.clone(),
            registry.clone(),
            cooldowns.clone(),
            stream_state.clone(),
            self.platform_api.clone(),
        ));

        Ok(BotFixture {
            settings,
            builtin_repo,
            custom_repo,
            chatter_repo,
            stream_repo,
            platform_api: self.platform_api,
            registry,
            cooldowns,
            stream_state,
            dispatcher,
            sender: Arc::new(RecordingChatSender::new()),
        })
    }
}

impl BotFixture {
    pub fn builder() -> BotFixtureBuilder {
        BotFixtureBuilder {
            settings: BotSettings::new(TEST_CHANNEL).with_website_url("https://bot.example"),
            builtins: default_commands(),
            custom: Vec::new(),
            platform_api: Arc::new(StaticPlatformApi::new()),
        }
    }

    /// Default built-ins, no custom commands, static platform API.
    pub async fn new() -> Result<Self, Error> {
        Self::builder().build().await
    }

    pub async fn go_live(&self, started_at: DateTime<Utc>) -> Result<StreamStatus, Error> {
        self.stream_state
            .went_live(StreamMetadata {
                stream_id: format!("stream-{}", started_at.timestamp()),
                title: Some("Test stream".into()),
                category: None,
                started_at,
            })
            .await
    }

    pub fn web_state(&self, eventsub_secret: &str) -> WebState {
        WebState::new(
            self.settings.clone(),
            self.registry.clone(),
            self.stream_state.clone(),
            self.platform_api.clone(),
            eventsub_secret,
        )
    }
}

/// A chatter with a stable id derived from the login.
pub fn chatter(login: &str, badges: &[&str]) -> Chatter {
    let id = login.bytes().fold(7i64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as i64)) & i64::MAX;
    Chatter::new(id, login, login).with_badges(badges.iter().copied())
}
