//! Live/offline state of the channel with title and category.
//!
//! The persistent store is the cache: every read is a single query against
//! the stream status table and every transition is a single write.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use paladinbot_common::models::{CategoryRef, StreamMetadata, StreamStatus};
use paladinbot_common::traits::repository_traits::StreamStatusRepository;
use crate::Error;

pub struct StreamStateCache {
    repo: Arc<dyn StreamStatusRepository>,
}

impl StreamStateCache {
    pub fn new(repo: Arc<dyn StreamStatusRepository>) -> Self {
        Self { repo }
    }

    /// The most recent record, or `None` if the channel has never gone live.
    pub async fn most_recent_status(&self) -> Result<Option<StreamStatus>, Error> {
        self.repo.most_recent().await
    }

    /// Whether the channel is live right now. No record counts as offline.
    pub async fn is_live(&self) -> Result<bool, Error> {
        Ok(self.most_recent_status().await?.is_some_and(|s| s.live))
    }

    /// The record that was current at `at`.
    pub async fn status_at(&self, at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error> {
        self.repo.status_at(at).await
    }

    pub async fn went_live(&self, meta: StreamMetadata) -> Result<StreamStatus, Error> {
        let status = self.repo.insert_live(&meta).await?;
        info!(
            stream_id = %status.stream_id,
            title = status.title.as_deref().unwrap_or(""),
            "stream went live"
        );
        Ok(status)
    }

    pub async fn went_offline(&self, ended_at: DateTime<Utc>) -> Result<StreamStatus, Error> {
        match self.repo.mark_offline(ended_at).await? {
            Some(status) => {
                info!(stream_id = %status.stream_id, "stream went offline");
                Ok(status)
            }
            None => {
                warn!("offline transition received but no stream is live");
                Err(Error::NotFound("no live stream record".into()))
            }
        }
    }

    pub async fn metadata_changed(
        &self,
        title: Option<&str>,
        category: Option<&CategoryRef>,
    ) -> Result<StreamStatus, Error> {
        match self.repo.update_metadata(title, category).await? {
            Some(status) => {
                info!(
                    title = status.title.as_deref().unwrap_or(""),
                    category = status.category_name.as_deref().unwrap_or(""),
                    "stream metadata updated"
                );
                Ok(status)
            }
            None => {
                warn!("metadata change received but there is no stream record");
                Err(Error::NotFound("no stream record".into()))
            }
        }
    }
}
