use async_trait::async_trait;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;
use crate::utils::target::resolve_target;

pub struct GameCommand;

#[async_trait]
impl BuiltinCommand for GameCommand {
    fn name(&self) -> &'static str {
        "game"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["category"]
    }

    fn description(&self) -> &'static str {
        "Get the current category of the stream."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe("Gives the current category of the stream", prefix, &["game", "category"])
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let target = resolve_target(invoker, args);
        let channel = ctx.settings.channel.as_str();
        let category = ctx
            .stream_state
            .most_recent_status()
            .await?
            .filter(|s| s.category_id.is_some())
            .and_then(|s| s.category_name)
            .filter(|name| !name.is_empty());

        Ok(match category {
            None => format!("@{}, {} isn't under a specific category", target, channel),
            Some(name) if name.eq_ignore_ascii_case("just chatting") => {
                format!("@{}, {} is under the category: {}", target, channel, name)
            }
            Some(name) => format!("@{}, {} is playing {}", target, channel, name),
        })
    }
}
