use serde::{Deserialize, Serialize};
use crate::models::Permission;

/// When a built-in command may run, relative to the channel's stream state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConditions {
    pub enabled_online: bool,
    pub enabled_offline: bool,
}

impl Default for CommandConditions {
    fn default() -> Self {
        Self {
            enabled_online: true,
            enabled_offline: true,
        }
    }
}

impl CommandConditions {
    pub fn allows(&self, live: bool) -> bool {
        (live && self.enabled_online) || (!live && self.enabled_offline)
    }
}

/// Stored mirror of a built-in command, as reconciled at startup and shown
/// on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinCommandRecord {
    pub name: String,
    pub aliases: Vec<String>,
    pub permissions: Vec<Permission>,
    pub description: String,
    pub dynamic_description: Vec<String>,
    pub global_cooldown: i32,
    pub user_cooldown: i32,
    pub enabled_offline: bool,
    pub enabled_online: bool,
    pub usage_count: i64,
}

impl BuiltinCommandRecord {
    /// Same command definition, ignoring the usage counter.
    pub fn same_definition(&self, other: &BuiltinCommandRecord) -> bool {
        self.name == other.name
            && self.aliases == other.aliases
            && self.permissions == other.permissions
            && self.description == other.description
            && self.dynamic_description == other.dynamic_description
            && self.global_cooldown == other.global_cooldown
            && self.user_cooldown == other.user_cooldown
            && self.enabled_offline == other.enabled_offline
            && self.enabled_online == other.enabled_online
    }
}

/// A moderator-authored chat command with a templated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub name: String,
    pub response: String,
    pub usage_count: i64,
}

impl CustomCommand {
    pub fn new(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: response.into(),
            usage_count: 0,
        }
    }
}
