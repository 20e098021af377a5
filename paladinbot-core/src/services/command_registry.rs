//! Built-in and custom commands, keyed by name and alias.
//!
//! Built-ins are fixed at construction. Custom commands are held in memory
//! behind a `RwLock` and mirrored to storage; every mutation writes storage
//! first and only touches memory once storage has accepted it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use paladinbot_common::error::RegistryError;
use paladinbot_common::models::{BuiltinCommandRecord, CustomCommand};
use paladinbot_common::traits::repository_traits::{
    BuiltinCommandRepository, CustomCommandRepository,
};
use crate::Error;
use crate::services::builtin_commands::{to_record, BuiltinCommand};

/// Result of resolving a command token.
#[derive(Clone)]
pub enum CommandMatch {
    Builtin(Arc<dyn BuiltinCommand>),
    Custom(CustomCommand),
}

/// What [`CommandRegistry::sync_to_storage`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Dashboard view of every command, with stored usage counts.
#[derive(Debug, Clone, Serialize)]
pub struct CommandCatalog {
    pub default_commands: Vec<BuiltinCommandRecord>,
    pub custom_commands: Vec<CustomCommand>,
}

#[derive(Debug, Clone, Serialize)]
pub enum CatalogEntry {
    #[serde(rename = "default_command")]
    Builtin(BuiltinCommandRecord),
    #[serde(rename = "custom_command")]
    Custom(CustomCommand),
}

pub struct CommandRegistry {
    prefix: String,
    builtins: Vec<Arc<dyn BuiltinCommand>>,
    custom: RwLock<Vec<CustomCommand>>,
    builtin_repo: Arc<dyn BuiltinCommandRepository>,
    custom_repo: Arc<dyn CustomCommandRepository>,
}

impl CommandRegistry {
    /// Fails if two built-ins share a name or alias.
    pub fn new(
        prefix: impl Into<String>,
        builtins: Vec<Arc<dyn BuiltinCommand>>,
        builtin_repo: Arc<dyn BuiltinCommandRepository>,
        custom_repo: Arc<dyn CustomCommandRepository>,
    ) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for cmd in &builtins {
            let tokens = std::iter::once(cmd.name()).chain(cmd.aliases().iter().copied());
            for token in tokens {
                if !seen.insert(token.to_lowercase()) {
                    return Err(Error::Config(format!(
                        "built-in command token '{}' is registered twice",
                        token
                    )));
                }
            }
        }

        Ok(Self {
            prefix: prefix.into(),
            builtins,
            custom: RwLock::new(Vec::new()),
            builtin_repo,
            custom_repo,
        })
    }

    /// Replaces the in-memory custom commands with what storage holds.
    pub async fn load_custom(&self) -> Result<usize, Error> {
        let stored = self.custom_repo.list_custom_commands().await?;
        let count = stored.len();
        *self.custom.write().await = stored;
        info!("Loaded {} custom commands", count);
        Ok(count)
    }

    pub fn builtins(&self) -> &[Arc<dyn BuiltinCommand>] {
        &self.builtins
    }

    /// Built-in whose name or alias equals `token`, case-insensitively.
    pub fn find_builtin(&self, token: &str) -> Option<Arc<dyn BuiltinCommand>> {
        let token = token.to_lowercase();
        self.builtins
            .iter()
            .find(|cmd| cmd.name() == token || cmd.aliases().iter().any(|a| *a == token))
            .cloned()
    }

    /// Built-ins win; custom commands are consulted only when no built-in
    /// name or alias matches.
    pub async fn lookup(&self, token: &str) -> Option<CommandMatch> {
        if let Some(cmd) = self.find_builtin(token) {
            return Some(CommandMatch::Builtin(cmd));
        }
        let token = token.to_lowercase();
        let custom = self.custom.read().await;
        custom
            .iter()
            .find(|c| c.name == token)
            .cloned()
            .map(CommandMatch::Custom)
    }

    pub async fn list_custom(&self) -> Vec<CustomCommand> {
        self.custom.read().await.clone()
    }

    pub async fn get_custom(&self, name: &str) -> Option<CustomCommand> {
        let name = name.to_lowercase();
        self.custom.read().await.iter().find(|c| c.name == name).cloned()
    }

    fn normalize_name(&self, raw: &str) -> Result<String, RegistryError> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(trimmed)
            .trim_start_matches('!');
        let name = stripped.to_lowercase();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName(raw.to_string()));
        }
        Ok(name)
    }

    pub async fn add_custom(
        &self,
        raw_name: &str,
        response: &str,
    ) -> Result<CustomCommand, RegistryError> {
        let name = self.normalize_name(raw_name)?;
        if self.find_builtin(&name).is_some() {
            return Err(RegistryError::AlreadyExists(name));
        }

        let mut custom = self.custom.write().await;
        if custom.iter().any(|c| c.name == name) {
            return Err(RegistryError::AlreadyExists(name));
        }

        let cmd = CustomCommand::new(name, response);
        self.custom_repo.insert_custom_command(&cmd).await?;
        custom.push(cmd.clone());
        info!(command = %cmd.name, "custom command created");
        Ok(cmd)
    }

    pub async fn edit_custom(
        &self,
        raw_name: &str,
        response: &str,
    ) -> Result<CustomCommand, RegistryError> {
        let name = self.normalize_name(raw_name)?;

        let mut custom = self.custom.write().await;
        let Some(idx) = custom.iter().position(|c| c.name == name) else {
            return Err(RegistryError::NotFound(name));
        };

        self.custom_repo.update_custom_command(&name, response).await?;
        custom[idx].response = response.to_string();
        info!(command = %name, "custom command updated");
        Ok(custom[idx].clone())
    }

    /// Returns the normalized name that was removed.
    pub async fn remove_custom(&self, raw_name: &str) -> Result<String, RegistryError> {
        let name = self.normalize_name(raw_name)?;

        let mut custom = self.custom.write().await;
        let Some(idx) = custom.iter().position(|c| c.name == name) else {
            return Err(RegistryError::NotFound(name));
        };

        self.custom_repo.delete_custom_command(&name).await?;
        custom.remove(idx);
        info!(command = %name, "custom command deleted");
        Ok(name)
    }

    pub async fn record_builtin_usage(&self, name: &str) {
        if let Err(e) = self.builtin_repo.increment_builtin_usage(name).await {
            error!(command = name, "failed to record built-in usage: {}", e);
        }
    }

    pub async fn record_custom_usage(&self, name: &str) {
        if let Err(e) = self.custom_repo.increment_custom_usage(name).await {
            error!(command = name, "failed to record custom command usage: {}", e);
        }
    }

    /// Reconciles the stored built-in catalog with the code: rows missing
    /// from code are deleted, rows in both are updated, rows only in code are
    /// inserted. Per-row failures are logged and counted.
    pub async fn sync_to_storage(&self) -> Result<SyncReport, Error> {
        let stored = self.builtin_repo.list_builtin_commands().await?;
        let stored: HashMap<String, BuiltinCommandRecord> =
            stored.into_iter().map(|r| (r.name.clone(), r)).collect();

        let in_code: Vec<BuiltinCommandRecord> = self
            .builtins
            .iter()
            .map(|cmd| to_record(cmd.as_ref(), &self.prefix))
            .collect();
        let code_names: HashSet<&str> = in_code.iter().map(|r| r.name.as_str()).collect();

        let mut report = SyncReport::default();

        for name in stored.keys().filter(|n| !code_names.contains(n.as_str())) {
            match self.builtin_repo.delete_builtin_command(name).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    error!(command = %name, "failed to delete stale command: {}", e);
                    report.failed += 1;
                }
            }
        }

        for record in &in_code {
            let result = match stored.get(&record.name) {
                Some(existing) if existing.same_definition(record) => {
                    report.unchanged += 1;
                    continue;
                }
                Some(_) => self
                    .builtin_repo
                    .update_builtin_command(record)
                    .await
                    .map(|_| report.updated += 1),
                None => self
                    .builtin_repo
                    .insert_builtin_command(record)
                    .await
                    .map(|_| report.inserted += 1),
            };
            if let Err(e) = result {
                error!(command = %record.name, "failed to sync command: {}", e);
                report.failed += 1;
            }
        }

        if report.failed > 0 {
            warn!(?report, "command catalog sync finished with failures");
        } else {
            debug!(?report, "command catalog sync finished");
        }
        Ok(report)
    }

    /// Every command with its stored usage count.
    pub async fn catalog(&self) -> Result<CommandCatalog, Error> {
        let builtin_counts: HashMap<String, i64> = self
            .builtin_repo
            .list_builtin_commands()
            .await?
            .into_iter()
            .map(|r| (r.name, r.usage_count))
            .collect();
        let custom_counts: HashMap<String, i64> = self
            .custom_repo
            .list_custom_commands()
            .await?
            .into_iter()
            .map(|c| (c.name, c.usage_count))
            .collect();

        let default_commands = self
            .builtins
            .iter()
            .map(|cmd| {
                let mut record = to_record(cmd.as_ref(), &self.prefix);
                record.usage_count = builtin_counts.get(&record.name).copied().unwrap_or(0);
                record
            })
            .collect();

        let custom_commands = self
            .list_custom()
            .await
            .into_iter()
            .map(|mut c| {
                c.usage_count = custom_counts.get(&c.name).copied().unwrap_or(c.usage_count);
                c
            })
            .collect();

        Ok(CommandCatalog {
            default_commands,
            custom_commands,
        })
    }

    /// A single catalog entry by name (aliases resolve to their built-in).
    pub async fn describe(&self, name: &str) -> Result<Option<CatalogEntry>, Error> {
        if let Some(cmd) = self.find_builtin(name) {
            let mut record = to_record(cmd.as_ref(), &self.prefix);
            if let Some(stored) = self.builtin_repo.get_builtin_command(cmd.name()).await? {
                record.usage_count = stored.usage_count;
            }
            return Ok(Some(CatalogEntry::Builtin(record)));
        }

        let Some(mut custom) = self.get_custom(name).await else {
            return Ok(None);
        };
        if let Some(stored) = self.custom_repo.get_custom_command(&custom.name).await? {
            custom.usage_count = stored.usage_count;
        }
        Ok(Some(CatalogEntry::Custom(custom)))
    }
}
