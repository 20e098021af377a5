use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;
use crate::utils::target::resolve_target;
use crate::utils::time::time_difference;

pub struct AccountAgeCommand;

#[async_trait]
impl BuiltinCommand for AccountAgeCommand {
    fn name(&self) -> &'static str {
        "accountage"
    }

    fn description(&self) -> &'static str {
        "Check the age of your account."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe("Checks the age of your Twitch account", prefix, &["accountage", "accountage <user>"])
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let target = resolve_target(invoker, args);
        let users = ctx.platform_api.resolve_users(&[target.clone()]).await?;

        let Some(user) = users.into_iter().next() else {
            debug!(login = %target, "accountage: no such user");
            return Ok(format!(
                "@{}, sorry I couldn't find a user with that name!",
                invoker.login
            ));
        };

        let elapsed = time_difference(user.created_at, Utc::now(), true);
        if target == invoker.login {
            Ok(format!("@{}, you created your account {} ago", target, elapsed))
        } else {
            Ok(format!("@{} created their account {} ago", target, elapsed))
        }
    }
}
