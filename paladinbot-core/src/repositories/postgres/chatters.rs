use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use paladinbot_common::error::Error;
use paladinbot_common::models::Chatter;
use paladinbot_common::traits::repository_traits::ChatterRepository;

pub struct PostgresChatterRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresChatterRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatterRepository for PostgresChatterRepository {
    async fn upsert_chatter(&self, chatter: &Chatter, seen_at: DateTime<Utc>) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO chatters (twitch_id, username, display_name, first_seen, last_seen)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (twitch_id) DO UPDATE
            SET username = EXCLUDED.username,
                display_name = EXCLUDED.display_name,
                last_seen = EXCLUDED.last_seen
            "#,
        )
            .bind(chatter.id)
            .bind(&chatter.login)
            .bind(&chatter.display_name)
            .bind(seen_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_chatter(&self, id: i64) -> Result<Option<Chatter>, Error> {
        let row_opt = sqlx::query(
            "SELECT twitch_id, username, display_name FROM chatters WHERE twitch_id = $1",
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(Chatter::new(
                r.try_get("twitch_id")?,
                r.try_get::<String, _>("username")?,
                r.try_get::<String, _>("display_name")?,
            ))),
            None => Ok(None),
        }
    }
}
