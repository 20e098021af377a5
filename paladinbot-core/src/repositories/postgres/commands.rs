// File: paladinbot-core/src/repositories/postgres/commands.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use paladinbot_common::error::Error;
use paladinbot_common::models::{BuiltinCommandRecord, Permission};
use paladinbot_common::traits::repository_traits::BuiltinCommandRepository;

pub struct PostgresBuiltinCommandRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresBuiltinCommandRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_record(r: &PgRow) -> Result<BuiltinCommandRecord, Error> {
    let aliases: Json<Vec<String>> = r.try_get("aliases")?;
    let permissions: Json<Vec<Permission>> = r.try_get("permissions")?;
    let dynamic_description: Json<Vec<String>> = r.try_get("dynamic_description")?;

    Ok(BuiltinCommandRecord {
        name: r.try_get("name")?,
        aliases: aliases.0,
        permissions: permissions.0,
        description: r.try_get("description")?,
        dynamic_description: dynamic_description.0,
        global_cooldown: r.try_get("global_cooldown")?,
        user_cooldown: r.try_get("user_cooldown")?,
        enabled_offline: r.try_get("enabled_offline")?,
        enabled_online: r.try_get("enabled_online")?,
        usage_count: r.try_get("usage_count")?,
    })
}

#[async_trait]
impl BuiltinCommandRepository for PostgresBuiltinCommandRepository {
    async fn list_builtin_commands(&self) -> Result<Vec<BuiltinCommandRecord>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT name, aliases, permissions, description, dynamic_description,
                   global_cooldown, user_cooldown, enabled_offline, enabled_online,
                   usage_count
            FROM commands
            ORDER BY name
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn get_builtin_command(&self, name: &str) -> Result<Option<BuiltinCommandRecord>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT name, aliases, permissions, description, dynamic_description,
                   global_cooldown, user_cooldown, enabled_offline, enabled_online,
                   usage_count
            FROM commands
            WHERE name = $1
            "#,
        )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(row_to_record).transpose()
    }

    async fn insert_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO commands (
                name,
                aliases,
                permissions,
                description,
                dynamic_description,
                global_cooldown,
                user_cooldown,
                enabled_offline,
                enabled_online,
                usage_count
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,0)
            "#,
        )
            .bind(&record.name)
            .bind(Json(&record.aliases))
            .bind(Json(&record.permissions))
            .bind(&record.description)
            .bind(Json(&record.dynamic_description))
            .bind(record.global_cooldown)
            .bind(record.user_cooldown)
            .bind(record.enabled_offline)
            .bind(record.enabled_online)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_builtin_command(&self, record: &BuiltinCommandRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE commands
            SET aliases = $2,
                permissions = $3,
                description = $4,
                dynamic_description = $5,
                global_cooldown = $6,
                user_cooldown = $7,
                enabled_offline = $8,
                enabled_online = $9
            WHERE name = $1
            "#,
        )
            .bind(&record.name)
            .bind(Json(&record.aliases))
            .bind(Json(&record.permissions))
            .bind(&record.description)
            .bind(Json(&record.dynamic_description))
            .bind(record.global_cooldown)
            .bind(record.user_cooldown)
            .bind(record.enabled_offline)
            .bind(record.enabled_online)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_builtin_command(&self, name: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM commands WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_builtin_usage(&self, name: &str) -> Result<(), Error> {
        sqlx::query("UPDATE commands SET usage_count = usage_count + 1 WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
