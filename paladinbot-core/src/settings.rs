use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Custom commands carry no cooldown metadata of their own; these are the
/// defaults applied to them. They are independent from the built-in
/// defaults even though the values happen to match.
pub const CUSTOM_USER_COOLDOWN_SECS: u32 = 30;
pub const CUSTOM_GLOBAL_COOLDOWN_SECS: u32 = 10;

/// Runtime settings shared by the dispatcher and the built-in commands.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Chat lines must start with this to be treated as commands.
    pub prefix: String,
    /// The single channel the bot serves, lowercase, without `#`.
    pub channel: String,
    pub bot_name: String,
    pub version: String,
    /// Process start, used for the bot's own uptime.
    pub started_at: DateTime<Utc>,
    pub timezone: Tz,
    /// Public site where the command list is published.
    pub website_url: String,
    pub custom_user_cooldown: u32,
    pub custom_global_cooldown: u32,
}

impl BotSettings {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            prefix: "!".to_string(),
            channel: channel.into().trim_start_matches('#').to_lowercase(),
            bot_name: "paladinbot".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
            timezone: chrono_tz::America::Chicago,
            website_url: String::new(),
            custom_user_cooldown: CUSTOM_USER_COOLDOWN_SECS,
            custom_global_cooldown: CUSTOM_GLOBAL_COOLDOWN_SECS,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_website_url(mut self, url: impl Into<String>) -> Self {
        self.website_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }
}
