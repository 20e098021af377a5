// File: paladinbot-core/src/repositories/postgres/custom_commands.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use paladinbot_common::error::Error;
use paladinbot_common::models::CustomCommand;
use paladinbot_common::traits::repository_traits::CustomCommandRepository;

pub struct PostgresCustomCommandRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresCustomCommandRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomCommandRepository for PostgresCustomCommandRepository {
    async fn list_custom_commands(&self) -> Result<Vec<CustomCommand>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT name, response, usage_count
            FROM custom_commands
            ORDER BY name
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(CustomCommand {
                name: r.try_get("name")?,
                response: r.try_get("response")?,
                usage_count: r.try_get("usage_count")?,
            });
        }
        Ok(out)
    }

    async fn get_custom_command(&self, name: &str) -> Result<Option<CustomCommand>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT name, response, usage_count
            FROM custom_commands
            WHERE name = $1
            "#,
        )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row_opt {
            Ok(Some(CustomCommand {
                name: r.try_get("name")?,
                response: r.try_get("response")?,
                usage_count: r.try_get("usage_count")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn insert_custom_command(&self, cmd: &CustomCommand) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO custom_commands (name, response, usage_count)
            VALUES ($1, $2, $3)
            "#,
        )
            .bind(&cmd.name)
            .bind(&cmd.response)
            .bind(cmd.usage_count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_custom_command(&self, name: &str, response: &str) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE custom_commands
            SET response = $2, updated_at = now()
            WHERE name = $1
            "#,
        )
            .bind(name)
            .bind(response)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("custom command '{}'", name)));
        }
        Ok(())
    }

    async fn delete_custom_command(&self, name: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM custom_commands WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_custom_usage(&self, name: &str) -> Result<(), Error> {
        sqlx::query("UPDATE custom_commands SET usage_count = usage_count + 1 WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
