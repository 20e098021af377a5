//! paladinbot-server/src/context.rs
//!
//! Wires storage, platform clients and engine services into one
//! `ServerContext`.

use std::net::SocketAddr;
use std::sync::Arc;
use chrono_tz::Tz;
use tracing::info;
use paladinbot_common::traits::api::PlatformApi;
use paladinbot_core::Error;
use paladinbot_core::db::Database;
use paladinbot_core::eventbus::EventBus;
use paladinbot_core::platforms::twitch_helix::TwitchHelixClient;
use paladinbot_core::platforms::twitch_irc::{IrcCredentials, TwitchIrcPlatform};
use paladinbot_core::repositories::{
    PostgresBuiltinCommandRepository, PostgresChatterRepository, PostgresCustomCommandRepository,
    PostgresStreamStatusRepository,
};
use paladinbot_core::services::builtin_commands::default_commands;
use paladinbot_core::services::{
    ChatService, CommandDispatcher, CommandRegistry, CooldownTracker, StreamStateCache,
};
use paladinbot_core::settings::BotSettings;
use paladinbot_core::web::WebState;

use crate::Args;

/// Everything the running bot holds on to.
pub struct ServerContext {
    pub db: Database,
    pub event_bus: EventBus,
    pub settings: Arc<BotSettings>,
    pub platform_api: Arc<dyn PlatformApi>,
    pub registry: Arc<CommandRegistry>,
    pub cooldowns: Arc<CooldownTracker>,
    pub stream_state: Arc<StreamStateCache>,
    pub chat_service: Arc<ChatService>,
    pub irc: Arc<TwitchIrcPlatform>,
    pub web_state: WebState,
    pub http_addr: SocketAddr,
}

impl ServerContext {
    /// Connects to Postgres, applies migrations, obtains a Helix token and
    /// loads the command catalog. Any failure here aborts startup.
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let timezone: Tz = args
            .timezone
            .parse()
            .map_err(|e| Error::Config(format!("invalid time zone '{}': {}", args.timezone, e)))?;
        let http_addr: SocketAddr = args.http_addr.parse()?;

        let settings = Arc::new(
            BotSettings::new(args.channel.as_str())
                .with_prefix(args.prefix.as_str())
                .with_timezone(timezone)
                .with_website_url(args.website_url.as_str()),
        );

        info!("Using Postgres DB URL: {}", redact_url(&args.database_url));
        let db = Database::new(&args.database_url).await?;
        db.migrate().await?;

        let builtin_repo = Arc::new(PostgresBuiltinCommandRepository::new(db.pool().clone()));
        let custom_repo = Arc::new(PostgresCustomCommandRepository::new(db.pool().clone()));
        let chatter_repo = Arc::new(PostgresChatterRepository::new(db.pool().clone()));
        let stream_repo = Arc::new(PostgresStreamStatusRepository::new(db.pool().clone()));

        let helix = TwitchHelixClient::new(&args.client_id, &args.client_secret);
        helix.refresh_app_access_token().await?;
        let platform_api: Arc<dyn PlatformApi> = Arc::new(helix);

        let registry = Arc::new(CommandRegistry::new(
            settings.prefix.clone(),
            default_commands(),
            builtin_repo,
            custom_repo,
        )?);
        registry.load_custom().await?;

        let event_bus = EventBus::new();
        let cooldowns = Arc::new(CooldownTracker::new());
        let stream_state = Arc::new(StreamStateCache::new(stream_repo));
        let dispatcher = Arc::new(CommandDispatcher::new(
            settings.clone(),
            registry.clone(),
            cooldowns.clone(),
            stream_state.clone(),
            platform_api.clone(),
        ));

        let irc = Arc::new(TwitchIrcPlatform::new(
            IrcCredentials {
                username: args.bot_username.clone(),
                oauth_token: args.bot_oauth.clone(),
            },
            &settings.channel,
            event_bus.clone(),
        ));
        let chat_service = Arc::new(ChatService::new(dispatcher, irc.clone(), chatter_repo));

        let web_state = WebState::new(
            settings.clone(),
            registry.clone(),
            stream_state.clone(),
            platform_api.clone(),
            &args.eventsub_secret,
        );

        Ok(Self {
            db,
            event_bus,
            settings,
            platform_api,
            registry,
            cooldowns,
            stream_state,
            chat_service,
            irc,
            web_state,
            http_addr,
        })
    }
}

/// Strips the password from a connection URL before it is logged.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let userinfo = &url[scheme_end + 3..at];
            match userinfo.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::redact_url;

    #[test]
    fn password_is_hidden() {
        assert_eq!(
            redact_url("postgres://bot:hunter2@db:5432/paladinbot"),
            "postgres://bot:***@db:5432/paladinbot"
        );
        assert_eq!(
            redact_url("postgres://bot@db/paladinbot"),
            "postgres://bot@db/paladinbot"
        );
    }
}
