use async_trait::async_trait;
use chrono::Utc;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;
use crate::utils::target::resolve_target;

/// Local time of the channel owner, in the configured zone.
pub struct TimeCommand;

#[async_trait]
impl BuiltinCommand for TimeCommand {
    fn name(&self) -> &'static str {
        "time"
    }

    fn description(&self) -> &'static str {
        "Returns the streamer's current local time."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe(
            "Gets the streamer's local time in 12 and 24 hour format.",
            prefix,
            &["time"],
        )
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let target = resolve_target(invoker, args);
        let local = Utc::now().with_timezone(&ctx.settings.timezone);

        Ok(format!(
            "@{} {}'s local time is {} ({})",
            target,
            ctx.settings.channel,
            local.format("%I:%M %p %Z"),
            local.format("%H:%M"),
        ))
    }
}
