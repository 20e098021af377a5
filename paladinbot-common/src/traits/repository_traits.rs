use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::error::Error;
use crate::models::{
    BuiltinCommandRecord, CategoryRef, Chatter, CustomCommand, StreamMetadata, StreamStatus,
};

/// Stored mirror of the built-in command catalog.
#[async_trait]
pub trait BuiltinCommandRepository: Send + Sync {
    async fn list_builtin_commands(&self) -> Result<Vec<BuiltinCommandRecord>, Error>;
    async fn get_builtin_command(&self, name: &str) -> Result<Option<BuiltinCommandRecord>, Error>;
    async fn insert_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error>;
    /// Overwrites the definition columns. The usage counter is left alone.
    async fn update_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error>;
    async fn delete_builtin_command(&self, name: &str) -> Result<(), Error>;
    async fn increment_builtin_usage(&self, name: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait CustomCommandRepository: Send + Sync {
    async fn list_custom_commands(&self) -> Result<Vec<CustomCommand>, Error>;
    async fn get_custom_command(&self, name: &str) -> Result<Option<CustomCommand>, Error>;
    async fn insert_custom_command(&self, cmd: &CustomCommand) -> Result<(), Error>;
    async fn update_custom_command(&self, name: &str, response: &str) -> Result<(), Error>;
    async fn delete_custom_command(&self, name: &str) -> Result<(), Error>;
    async fn increment_custom_usage(&self, name: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait ChatterRepository: Send + Sync {
    /// Inserts the chatter or refreshes their names and last-seen time.
    async fn upsert_chatter(&self, chatter: &Chatter, seen_at: DateTime<Utc>) -> Result<(), Error>;
    async fn get_chatter(&self, id: i64) -> Result<Option<Chatter>, Error>;
}

#[async_trait]
pub trait StreamStatusRepository: Send + Sync {
    async fn most_recent(&self) -> Result<Option<StreamStatus>, Error>;

    /// Most recent record that started at or before `at`.
    async fn status_at(&self, at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error>;

    /// Closes any record still marked live (with `meta.started_at` as its end)
    /// and appends a new live record, atomically.
    async fn insert_live(&self, meta: &StreamMetadata) -> Result<StreamStatus, Error>;

    /// Closes the live record. Returns `None` if nothing was live.
    async fn mark_offline(&self, ended_at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error>;

    /// Updates title and/or category of the most recent record. `None`
    /// fields are left as they are. Returns `None` if there is no record.
    async fn update_metadata(
        &self,
        title: Option<&str>,
        category: Option<&CategoryRef>,
    ) -> Result<Option<StreamStatus>, Error>;
}
