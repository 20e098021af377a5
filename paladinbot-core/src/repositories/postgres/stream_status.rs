// File: paladinbot-core/src/repositories/postgres/stream_status.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use paladinbot_common::error::Error;
use paladinbot_common::models::{CategoryRef, StreamMetadata, StreamStatus};
use paladinbot_common::traits::repository_traits::StreamStatusRepository;

const COLUMNS: &str =
    "id, stream_id, game_id, game_name, live, title, started_at, ended_at";

pub struct PostgresStreamStatusRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresStreamStatusRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_status(r: &PgRow) -> Result<StreamStatus, Error> {
    Ok(StreamStatus {
        id: r.try_get("id")?,
        stream_id: r.try_get("stream_id")?,
        live: r.try_get("live")?,
        title: r.try_get("title")?,
        category_id: r.try_get("game_id")?,
        category_name: r.try_get("game_name")?,
        started_at: r.try_get("started_at")?,
        ended_at: r.try_get("ended_at")?,
    })
}

#[async_trait]
impl StreamStatusRepository for PostgresStreamStatusRepository {
    async fn most_recent(&self) -> Result<Option<StreamStatus>, Error> {
        let row_opt = sqlx::query(&format!(
            "SELECT {} FROM stream_status ORDER BY id DESC LIMIT 1",
            COLUMNS
        ))
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_status).transpose()
    }

    async fn status_at(&self, at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error> {
        let row_opt = sqlx::query(&format!(
            "SELECT {} FROM stream_status WHERE started_at <= $1 ORDER BY started_at DESC, id DESC LIMIT 1",
            COLUMNS
        ))
            .bind(at)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_status).transpose()
    }

    async fn insert_live(&self, meta: &StreamMetadata) -> Result<StreamStatus, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE stream_status
            SET live = FALSE, ended_at = COALESCE(ended_at, $1)
            WHERE live
            "#,
        )
            .bind(meta.started_at)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO stream_status (stream_id, game_id, game_name, live, title, started_at)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
            .bind(&meta.stream_id)
            .bind(meta.category.as_ref().map(|c| c.id.as_str()))
            .bind(meta.category.as_ref().map(|c| c.name.as_str()))
            .bind(meta.title.as_deref())
            .bind(meta.started_at)
            .fetch_one(&mut *tx)
            .await?;

        let status = row_to_status(&row)?;
        tx.commit().await?;
        Ok(status)
    }

    async fn mark_offline(&self, ended_at: DateTime<Utc>) -> Result<Option<StreamStatus>, Error> {
        let row_opt = sqlx::query(&format!(
            r#"
            UPDATE stream_status
            SET live = FALSE, ended_at = $1
            WHERE live
            RETURNING {}
            "#,
            COLUMNS
        ))
            .bind(ended_at)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_status).transpose()
    }

    async fn update_metadata(
        &self,
        title: Option<&str>,
        category: Option<&CategoryRef>,
    ) -> Result<Option<StreamStatus>, Error> {
        let row_opt = sqlx::query(&format!(
            r#"
            UPDATE stream_status
            SET title = COALESCE($1, title),
                game_id = COALESCE($2, game_id),
                game_name = COALESCE($3, game_name)
            WHERE id = (SELECT id FROM stream_status ORDER BY id DESC LIMIT 1)
            RETURNING {}
            "#,
            COLUMNS
        ))
            .bind(title)
            .bind(category.map(|c| c.id.as_str()))
            .bind(category.map(|c| c.name.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_status).transpose()
    }
}
