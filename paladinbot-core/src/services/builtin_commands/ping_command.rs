use async_trait::async_trait;
use chrono::Utc;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::BuiltinCommand;
use crate::services::dispatcher::CommandContext;
use crate::utils::time::time_difference;

pub struct PingCommand;

#[async_trait]
impl BuiltinCommand for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Ping the bot."
    }

    /// Same window as the global one, so a chatter can re-ping as soon as
    /// the channel can.
    fn user_cooldown(&self) -> u32 {
        10
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        vec![
            "Pings the bot and returns the uptime.".to_string(),
            "<br/>".to_string(),
            format!("<code>{}ping</code>", prefix),
        ]
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        _args: &[String],
    ) -> Result<String, CommandError> {
        let uptime = time_difference(ctx.settings.started_at, Utc::now(), true);
        Ok(format!("@{}, FeelsOkayMan 🏓 Uptime: {}", invoker.login, uptime))
    }
}
