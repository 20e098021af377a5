//! Turns a chat line into at most one reply.
//!
//! Built-in path: permission, stream-state eligibility, body, cooldown,
//! usage. The body runs before the cooldown gate, so a command rejected by
//! cooldown has still done its work; only a successful gate publishes the
//! reply. Errors never consume a cooldown.
//!
//! Custom path: broadcaster/moderator bypass or cooldown gate, usage,
//! variable expansion.

use std::sync::Arc;
use tracing::{debug, error, info};
use paladinbot_common::error::{CommandError, RegistryError};
use paladinbot_common::models::{Chatter, CustomCommand};
use paladinbot_common::traits::api::PlatformApi;
use crate::services::builtin_commands::BuiltinCommand;
use crate::services::command_registry::{CommandMatch, CommandRegistry};
use crate::services::cooldown::CooldownTracker;
use crate::services::permissions;
use crate::services::stream_state::StreamStateCache;
use crate::services::variables::{VariableContext, VariableEngine};
use crate::settings::BotSettings;

/// What a built-in body can reach.
pub struct CommandContext<'a> {
    pub channel: &'a str,
    pub settings: &'a BotSettings,
    pub registry: &'a CommandRegistry,
    pub stream_state: &'a StreamStateCache,
    pub platform_api: &'a Arc<dyn PlatformApi>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    PermissionDenied,
    StreamState,
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command, or no command by that name.
    Ignored,
    /// A command matched but nothing is said in chat.
    Suppressed(SuppressReason),
    Reply(String),
    /// The invocation failed; the text tells the chatter what happened.
    ErrorReported(String),
}

impl DispatchOutcome {
    /// The text to send to chat, if any.
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Reply(text) | DispatchOutcome::ErrorReported(text)
                if !text.trim().is_empty() =>
            {
                Some(text.as_str())
            }
            _ => None,
        }
    }
}

pub struct CommandDispatcher {
    settings: Arc<BotSettings>,
    registry: Arc<CommandRegistry>,
    cooldowns: Arc<CooldownTracker>,
    stream_state: Arc<StreamStateCache>,
    platform_api: Arc<dyn PlatformApi>,
    variables: VariableEngine,
}

impl CommandDispatcher {
    pub fn new(
        settings: Arc<BotSettings>,
        registry: Arc<CommandRegistry>,
        cooldowns: Arc<CooldownTracker>,
        stream_state: Arc<StreamStateCache>,
        platform_api: Arc<dyn PlatformApi>,
    ) -> Self {
        Self {
            settings,
            registry,
            cooldowns,
            stream_state,
            platform_api,
            variables: VariableEngine::with_defaults(),
        }
    }

    pub fn with_variables(mut self, variables: VariableEngine) -> Self {
        self.variables = variables;
        self
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub async fn dispatch(&self, channel: &str, chatter: &Chatter, text: &str) -> DispatchOutcome {
        let Some(body) = text.strip_prefix(self.settings.prefix.as_str()) else {
            return DispatchOutcome::Ignored;
        };
        // The command name must follow the prefix directly.
        if body.starts_with(char::is_whitespace) {
            return DispatchOutcome::Ignored;
        }

        let mut tokens = body.split_whitespace();
        let Some(first) = tokens.next() else {
            return DispatchOutcome::Ignored;
        };
        let candidate = first.to_lowercase();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        match self.registry.lookup(&candidate).await {
            Some(CommandMatch::Builtin(cmd)) => {
                self.run_builtin(cmd.as_ref(), channel, chatter, &args).await
            }
            Some(CommandMatch::Custom(cmd)) => self.run_custom(&cmd, channel, chatter, &args).await,
            None => {
                debug!(token = %candidate, "no such command");
                DispatchOutcome::Ignored
            }
        }
    }

    async fn run_builtin(
        &self,
        cmd: &dyn BuiltinCommand,
        channel: &str,
        chatter: &Chatter,
        args: &[String],
    ) -> DispatchOutcome {
        let name = cmd.name();

        if !permissions::is_permitted(cmd.permissions(), &chatter.badges) {
            debug!(command = name, user = %chatter.login, "permission denied");
            return DispatchOutcome::Suppressed(SuppressReason::PermissionDenied);
        }

        let live = match self.stream_state.is_live().await {
            Ok(live) => live,
            Err(e) => {
                error!(command = name, user = %chatter.login, channel, "failed to read stream state: {}", e);
                return DispatchOutcome::ErrorReported(self.generic_failure(chatter));
            }
        };
        if !cmd.conditions().allows(live) {
            debug!(command = name, live, "command not enabled in this stream state");
            return DispatchOutcome::Suppressed(SuppressReason::StreamState);
        }

        let ctx = CommandContext {
            channel,
            settings: &self.settings,
            registry: &self.registry,
            stream_state: &self.stream_state,
            platform_api: &self.platform_api,
        };
        let response = match cmd.execute(&ctx, chatter, args).await {
            Ok(response) => response,
            Err(e) => return self.report_error(name, channel, chatter, e),
        };

        if !self.cooldowns.can_proceed(&chatter.login, name, cmd.user_cooldown(), cmd.global_cooldown()) {
            return DispatchOutcome::Suppressed(SuppressReason::Cooldown);
        }

        self.registry.record_builtin_usage(name).await;
        info!(command = name, user = %chatter.login, channel, "command executed");
        DispatchOutcome::Reply(response)
    }

    async fn run_custom(
        &self,
        cmd: &CustomCommand,
        channel: &str,
        chatter: &Chatter,
        args: &[String],
    ) -> DispatchOutcome {
        let bypass = permissions::can_bypass_cooldown(&chatter.badges);
        if !bypass
            && !self.cooldowns.can_proceed(
                &chatter.login,
                &cmd.name,
                self.settings.custom_user_cooldown,
                self.settings.custom_global_cooldown,
            )
        {
            return DispatchOutcome::Suppressed(SuppressReason::Cooldown);
        }

        self.registry.record_custom_usage(&cmd.name).await;

        let vars = VariableContext {
            channel,
            invoker: chatter,
            args,
        };
        let response = self.variables.expand(&cmd.response, &vars);
        info!(command = %cmd.name, user = %chatter.login, channel, bypass, "custom command executed");
        DispatchOutcome::Reply(response)
    }

    fn report_error(
        &self,
        command: &str,
        channel: &str,
        chatter: &Chatter,
        err: CommandError,
    ) -> DispatchOutcome {
        let text = match err {
            CommandError::Usage(hint) => format!("@{}, usage: {}", chatter.login, hint),
            CommandError::Registry(RegistryError::Storage(e)) => {
                error!(command, user = %chatter.login, channel, "storage failure: {}", e);
                self.generic_failure(chatter)
            }
            CommandError::Registry(e) => format!("@{}, {}", chatter.login, e),
            CommandError::Failed(e) => {
                error!(command, user = %chatter.login, channel, "command failed: {}", e);
                self.generic_failure(chatter)
            }
        };
        DispatchOutcome::ErrorReported(text)
    }

    fn generic_failure(&self, chatter: &Chatter) -> String {
        format!("@{}, something went wrong... please try again later.", chatter.login)
    }
}
