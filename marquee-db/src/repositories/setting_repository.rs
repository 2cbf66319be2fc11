// Marquee - Rental & events marketing site built with Rust
// Copyright (C) 2025 Marquee Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use marquee_core::models::setting::Setting;
use sqlx::{Executor, Sqlite, SqlitePool};

use super::parse_datetime;

pub struct SettingRepository {
    pool: SqlitePool,
}

impl SettingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, key: &str) -> Result<Option<Setting>> {
        let row = sqlx::query_as::<_, (String, Option<String>, String)>(
            r#"
            SELECT key, value, updated_at
            FROM settings
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find setting by key")?;

        row.map(row_to_setting).transpose()
    }

    /// Insert or overwrite the value stored under `key`
    pub async fn upsert(&self, key: &str, value: Option<&str>) -> Result<()> {
        upsert_setting(&self.pool, key, value).await
    }

    /// Remove a key; returns whether a row existed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .context("Failed to delete setting")?
            .rows_affected();

        Ok(rows > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<Setting>> {
        let rows = sqlx::query_as::<_, (String, Option<String>, String)>(
            r#"
            SELECT key, value, updated_at
            FROM settings
            ORDER BY key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list settings")?;

        rows.into_iter().map(row_to_setting).collect()
    }
}

/// Upsert against any executor, so callers can run it inside a transaction
pub async fn upsert_setting<'e, E>(executor: E, key: &str, value: Option<&str>) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(chrono::Utc::now())
    .execute(executor)
    .await
    .with_context(|| format!("Failed to store setting '{}'", key))?;

    Ok(())
}

fn row_to_setting(row: (String, Option<String>, String)) -> Result<Setting> {
    let (key, value, updated_at_str) = row;
    Ok(Setting {
        key,
        value,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}
