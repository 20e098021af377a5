use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One broadcast of the channel. Records are appended when the channel goes
/// live and closed in place when it goes offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStatus {
    pub id: i64,
    pub stream_id: String,
    pub live: bool,
    pub title: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Payload of a go-live transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub stream_id: String,
    pub title: Option<String>,
    pub category: Option<CategoryRef>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}
