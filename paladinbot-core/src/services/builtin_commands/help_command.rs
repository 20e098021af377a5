use async_trait::async_trait;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::Chatter;
use crate::services::builtin_commands::{describe, BuiltinCommand};
use crate::services::dispatcher::CommandContext;

pub struct HelpCommand;

#[async_trait]
impl BuiltinCommand for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["about", "commands"]
    }

    fn description(&self) -> &'static str {
        "Gives you information about the bot."
    }

    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        describe(
            "Gives you information about the bot as well as the current version.",
            prefix,
            &["help", "about", "commands"],
        )
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError> {
        let site = &ctx.settings.website_url;

        if let Some(topic) = args.first() {
            let topic = topic
                .trim_start_matches(ctx.settings.prefix.as_str())
                .to_lowercase();
            return Ok(format!(
                "@{} help for the command \"{}\": {}/commands/{}",
                invoker.login, topic, site, topic
            ));
        }

        Ok(format!(
            "@{}, {} version {} serving {}. Commands: {}/",
            invoker.login, ctx.settings.bot_name, ctx.settings.version, ctx.settings.channel, site
        ))
    }
}
