// File: paladinbot-core/src/services/builtin_commands/mod.rs
//! Commands compiled into the bot. Each lives in its own file and implements
//! [`BuiltinCommand`]; [`default_commands`] is the catalog the registry is
//! built from.

pub mod accountage_command;
pub mod game_command;
pub mod help_command;
pub mod manage_commands;
pub mod ping_command;
pub mod time_command;
pub mod title_command;
pub mod uptime_command;

use std::sync::Arc;
use async_trait::async_trait;
use paladinbot_common::error::CommandError;
use paladinbot_common::models::{BuiltinCommandRecord, Chatter, CommandConditions, Permission};
use crate::services::dispatcher::CommandContext;

pub const DEFAULT_USER_COOLDOWN_SECS: u32 = 30;
pub const DEFAULT_GLOBAL_COOLDOWN_SECS: u32 = 10;

#[async_trait]
pub trait BuiltinCommand: Send + Sync {
    /// Canonical lowercase name; also the cooldown and usage key.
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Capabilities of which the invoker needs at least one. Empty means
    /// anyone may run it.
    fn permissions(&self) -> &'static [Permission] {
        &[]
    }

    fn description(&self) -> &'static str;

    /// Longer help shown on the command list page.
    fn dynamic_description(&self, prefix: &str) -> Vec<String> {
        vec![format!("<code>{}{}</code>", prefix, self.name())]
    }

    fn conditions(&self) -> CommandConditions {
        CommandConditions::default()
    }

    fn user_cooldown(&self) -> u32 {
        DEFAULT_USER_COOLDOWN_SECS
    }

    fn global_cooldown(&self) -> u32 {
        DEFAULT_GLOBAL_COOLDOWN_SECS
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        invoker: &Chatter,
        args: &[String],
    ) -> Result<String, CommandError>;
}

/// Summary line followed by one `<code>` line per invocation form.
pub(crate) fn describe(summary: &str, prefix: &str, invocations: &[&str]) -> Vec<String> {
    let mut lines = vec![summary.to_string()];
    for form in invocations {
        lines.push("<br/>".to_string());
        lines.push(format!("<code>{}{}</code>", prefix, form));
    }
    lines
}

/// Storage/dashboard projection of a built-in, with a zero usage count.
pub fn to_record(cmd: &dyn BuiltinCommand, prefix: &str) -> BuiltinCommandRecord {
    let conditions = cmd.conditions();
    BuiltinCommandRecord {
        name: cmd.name().to_string(),
        aliases: cmd.aliases().iter().map(|a| a.to_string()).collect(),
        permissions: cmd.permissions().to_vec(),
        description: cmd.description().to_string(),
        dynamic_description: cmd.dynamic_description(prefix),
        global_cooldown: cmd.global_cooldown() as i32,
        user_cooldown: cmd.user_cooldown() as i32,
        enabled_offline: conditions.enabled_offline,
        enabled_online: conditions.enabled_online,
        usage_count: 0,
    }
}

/// The full built-in catalog, in lookup order.
pub fn default_commands() -> Vec<Arc<dyn BuiltinCommand>> {
    vec![
        Arc::new(ping_command::PingCommand),
        Arc::new(uptime_command::UptimeCommand),
        Arc::new(title_command::TitleCommand),
        Arc::new(game_command::GameCommand),
        Arc::new(time_command::TimeCommand),
        Arc::new(help_command::HelpCommand),
        Arc::new(accountage_command::AccountAgeCommand),
        Arc::new(manage_commands::CommandCommand),
    ]
}
