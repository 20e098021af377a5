// File: paladinbot-core/src/test_utils/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use paladinbot_common::models::{
    BuiltinCommandRecord, CategoryRef, Chatter, CustomCommand, StreamMetadata, StreamStatus,
};
use paladinbot_common::traits::repository_traits::{
    BuiltinCommandRepository, ChatterRepository, CustomCommandRepository, StreamStatusRepository,
};
use crate::Error;

/// Switch shared by the in-memory stores: when set, every write fails with
/// `Error::Storage` and leaves the data untouched.
#[derive(Default)]
pub struct FailSwitch {
    writes: AtomicBool,
    reads: AtomicBool,
}

impl FailSwitch {
    fn check_write(&self) -> Result<(), Error> {
        if self.writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated write failure".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), Error> {
        if self.reads.load(Ordering::SeqCst) {
            return Err(Error::Storage("simulated read failure".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBuiltinCommandRepository {
    rows: Mutex<HashMap<String, BuiltinCommandRecord>>,
    fail: FailSwitch,
    /// Names whose writes fail even when the global switch is off.
    failing_names: Mutex<Vec<String>>,
}

impl MemoryBuiltinCommandRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = BuiltinCommandRecord>) -> Self {
        let repo = Self::default();
        repo.rows
            .lock()
            .extend(rows.into_iter().map(|r| (r.name.clone(), r)));
        repo
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail.writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail.reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, name: &str) {
        self.failing_names.lock().push(name.to_string());
    }

    pub fn snapshot(&self) -> HashMap<String, BuiltinCommandRecord> {
        self.rows.lock().clone()
    }

    pub fn usage(&self, name: &str) -> i64 {
        self.rows.lock().get(name).map(|r| r.usage_count).unwrap_or(0)
    }

    fn check_write(&self, name: &str) -> Result<(), Error> {
        self.fail.check_write()?;
        if self.failing_names.lock().iter().any(|n| n == name) {
            return Err(Error::Storage(format!("simulated write failure for {}", name)));
        }
        Ok(())
    }
}

#[async_trait]
impl BuiltinCommandRepository for MemoryBuiltinCommandRepository {
    async fn list_builtin_commands(&self) -> Result<Vec<BuiltinCommandRecord>, Error> {
        self.fail.check_read()?;
        let mut rows: Vec<_> = self.rows.lock().values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_builtin_command(&self, name: &str) -> Result<Option<BuiltinCommandRecord>, Error> {
        self.fail.check_read()?;
        Ok(self.rows.lock().get(name).cloned())
    }

    async fn insert_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error> {
        self.check_write(&record.name)?;
        let mut rows = self.rows.lock();
        if rows.contains_key(&record.name) {
            return Err(Error::Storage(format!("duplicate key {}", record.name)));
        }
        rows.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn update_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error> {
        self.check_write(&record.name)?;
        let mut rows = self.rows.lock();
        let row = rows
            .get_mut(&record.name)
            .ok_or_else(|| Error::NotFound(record.name.clone()))?;
        let usage_count = row.usage_count;
        *row = BuiltinCommandRecord {
            usage_count,
            ..record.clone()
        };
        Ok(())
    }

    async fn delete_builtin_command(&self, name: &str) -> Result<(), Error> {
        self.check_write(name)?;
        self.rows.lock().remove(name);
        Ok(())
    }

    async fn increment_builtin_usage(&self, name: &str) -> Result<(), Error> {
        self.check_write(name)?;
        if let Some(row) = self.rows.lock().get_mut(name) {
            row.usage_count += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCustomCommandRepository {
    rows: Mutex<Vec<CustomCommand>>,
    fail: FailSwitch,
}

impl MemoryCustomCommandRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: impl IntoIterator<Item = CustomCommand>) -> Self {
        let repo = Self::default();
        repo.rows.lock().extend(commands);
        repo
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail.writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<CustomCommand> {
        self.rows.lock().clone()
    }

    pub fn usage(&self, name: &str) -> i64 {
        self.rows
            .lock()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.usage_count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CustomCommandRepository for MemoryCustomCommandRepository {
    async fn list_custom_commands(&self) -> Result<Vec<CustomCommand>, Error> {
        self.fail.check_read()?;
        Ok(self.rows.lock().clone())
    }

    async fn get_custom_command(&self, name: &str) -> Result<Option<CustomCommand>, Error> {
        self.fail.check_read()?;
        Ok(self.rows.lock().iter().find(|c| c.name == name).cloned())
    }

    async fn insert_custom_command(&self, cmd: &CustomCommand) -> Result<(), Error> {
        self.fail.check_write()?;
        let mut rows = self.rows.lock();
        if rows.iter().any(|c| c.name == cmd.name) {
            return Err(Error::Storage(format!("duplicate key {}", cmd.name)));
        }
        rows.push(cmd.clone());
        Ok(())
    }

    async fn update_custom_command(&self, name: &str, response: &str) -> Result<(), Error> {
        self.fail.check_write()?;
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        row.response = response.to_string();
        Ok(())
    }

    async fn delete_custom_command(&self, name: &str) -> Result<(), Error> {
        self.fail.check_write()?;
        self.rows.lock().retain(|c| c.name != name);
        Ok(())
    }

    async fn increment_custom_usage(&self, name: &str) -> Result<(), Error> {
        self.fail.check_write()?;
        if let Some(row) = self.rows.lock().iter_mut().find(|c| c.name == name) {
            row.usage_count += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryChatterRepository {
    rows: Mutex<HashMap<i64, (Chatter, DateTime<Utc>)>>,
    fail: FailSwitch,
    upserts: AtomicUsize,
}

impl MemoryChatterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail.writes.store(fail, Ordering::SeqCst);
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn last_seen(&self, id: i64) -> Option<DateTime<Utc>> {
        self.rows.lock().get(&id).map(|(_, seen)| *seen)
    }
}

#[async_trait]
impl ChatterRepository for MemoryChatterRepository {
    async fn upsert_chatter(&self, chatter: &Chatter, seen_at: DateTime<Utc>) -> Result<(), Error> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.fail.check_write()?;
        self.rows.lock().insert(chatter.id, (chatter.clone(), seen_at));
        Ok(())
    }

    async fn get_chatter(&self, id: i64) -> Result<Option<Chatter>, Error> {
        self.fail.check_read()?;
        Ok(self.rows.lock().get(&id).map(|(c, _)| c.clone()))
    }
}

#[derive(Default)]
pub struct MemoryStreamStatusRepository {
    rows: Mutex<Vec<StreamStatus>>,
    fail: FailSwitch,
}

impl MemoryStreamStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail.reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail.writes.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<StreamStatus> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl StreamStatusRepository for MemoryStreamStatusRepository {
    async fn most_recent(&self) -> Result<Option<StreamStatus>, Error> {
        self.fail.check_read()?;
        Ok(self.rows.lock().iter().max_by_key(|s| (s.started_at, s.id)).cloned())
    }

    async fn status_at(&self, at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error> {
        self.fail.check_read()?;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|s| s.started_at <= at)
            .max_by_key(|s| (s.started_at, s.id))
            .cloned())
    }

    async fn insert_live(&self, meta: &StreamMetadata) -> Result<StreamStatus, Error> {
        self.fail.check_write()?;
        let mut rows = self.rows.lock();
        for row in rows.iter_mut().filter(|s| s.live) {
            row.live = false;
            row.ended_at = Some(meta.started_at);
        }
        let status = StreamStatus {
            id: rows.len() as i64 + 1,
            stream_id: meta.stream_id.clone(),
            live: true,
            title: meta.title.clone(),
            category_id: meta.category.as_ref().map(|c| c.id.clone()),
            category_name: meta.category.as_ref().map(|c| c.name.clone()),
            started_at: meta.started_at,
            ended_at: None,
        };
        rows.push(status.clone());
        Ok(status)
    }

    async fn mark_offline(&self, ended_at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error> {
        self.fail.check_write()?;
        let mut rows = self.rows.lock();
        let Some(row) = rows.iter_mut().find(|s| s.live) else {
            return Ok(None);
        };
        row.live = false;
        row.ended_at = Some(ended_at);
        Ok(Some(row.clone()))
    }

    async fn update_metadata(
        &self,
        title: Option<&str>,
        category: Option<&CategoryRef>,
    ) -> Result<Option<StreamStatus>, Error> {
        self.fail.check_write()?;
        let mut rows = self.rows.lock();
        let Some(row) = rows.iter_mut().max_by_key(|s| (s.started_at, s.id)) else {
            return Ok(None);
        };
        if let Some(title) = title {
            row.title = Some(title.to_string());
        }
        if let Some(category) = category {
            row.category_id = Some(category.id.clone());
            row.category_name = Some(category.name.clone());
        }
        Ok(Some(row.clone()))
    }
}
