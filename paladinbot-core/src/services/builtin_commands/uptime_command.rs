use async_trait::async_trait;
use chrono::Utc;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;
use crate::utils::target::resolve_target;
use crate::utils::time::time_difference;

pub struct UptimeCommand;

#[async_trait]
impl BuiltinCommand for UptimeCommand {
    fn name(&self) -> &'static str {
        "uptime"
    }

    fn description(&self) -> &'static str {
        "Gets the current time elapsed since the stream started."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe(self.description(), prefix, &["uptime"])
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let target = resolve_target(invoker, args);
        let now = Utc::now();

        let reply = match ctx.stream_state.most_recent_status().await? {
            None => format!("@{}, the stream has not gone live yet", target),
            Some(status) if status.live => format!(
                "@{}, the stream has been live for {}",
                target,
                time_difference(status.started_at, now, true)
            ),
            Some(status) => {
                let ended = status.ended_at.unwrap_or(status.started_at);
                format!(
                    "@{}, the stream has been offline for {}",
                    target,
                    time_difference(ended, now, true)
                )
            }
        };
        Ok(reply)
    }
}
