use async_trait::async_trait;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;
use crate::utils::target::resolve_target;

pub struct TitleCommand;

#[async_trait]
impl BuiltinCommand for TitleCommand {
    fn name(&self) -> &'static str {
        "title"
    }

    fn description(&self) -> &'static str {
        "Get the title of the stream."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe("Gets the current title of the stream.", prefix, &["title"])
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let target = resolve_target(invoker, args);
        let title = ctx
            .stream_state
            .most_recent_status()
            .await?
            .and_then(|s| s.title)
            .filter(|t| !t.is_empty());

        Ok(match title {
            Some(title) => format!("@{} current title: {}", target, title),
            None => format!("@{} the title is not set to anything", target),
        })
    }
}
