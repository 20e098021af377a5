//! `!command create|edit|delete` for moderators.

use async_trait::async_trait;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::{Chatter, Permission};
use crate::services::builtin_commands::BuiltinCommand;
use crate::services::dispatcher::CommandContext;

const USAGE: &str = "command create|edit|delete <name> [response]";

pub struct CommandCommand;

#[async_trait]
impl BuiltinCommand for CommandCommand {
    fn name(&self) -> &'static str {
        "command"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["cmd"]
    }

    fn permissions(&self) -> &'static [Permission] {
        &[Permission::Broadcaster, Permission::Moderator]
    }

    fn description(&self) -> &'static str {
        "Create/edit/delete custom commands."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        vec![
            "Create a command with a name and message".to_string(),
            "<br/>".to_string(),
            format!("<code>{}command create (name) (response)</code>", prefix),
            "<br/>".to_string(),
            "Edit a command with a name and message".to_string(),
            format!("<code>{}command edit (name) (response)</code>", prefix),
            "<br/>".to_string(),
            "Delete a command with a name".to_string(),
            format!("<code>{}command delete (name)</code>", prefix),
        ]
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        _invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let usage = || CommandError::Usage(format!("{}{}", ctx.settings.prefix, USAGE));

        let (Some(action), Some(raw_name)) = (args.first(), args.get(1)) else {
            return Err(usage());
        };
        let response = args[2..].join(" ");

        match action.to_lowercase().as_str() {
            "create" | "add" => {
                if response.is_empty() {
                    return Err(usage());
                }
                let cmd = ctx.registry.add_custom(raw_name, &response).await?;
                Ok(format!("Command '{}' created with response: {}", cmd.name, cmd.response))
            }
            "edit" => {
                if response.is_empty() {
                    return Err(usage());
                }
                let cmd = ctx.registry.edit_custom(raw_name, &response).await?;
                Ok(format!("Command '{}' updated with new response: {}", cmd.name, cmd.response))
            }
            "delete" | "remove" => {
                let name = ctx.registry.remove_custom(raw_name).await?;
                Ok(format!("Command '{}' deleted", name))
            }
            _ => Err(usage()),
        }
    }
}
