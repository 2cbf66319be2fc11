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
use marquee_core::models::session::Session;
use sqlx::SqlitePool;

use super::parse_datetime;

pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create session")?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, i64, String, String)>(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find session by id")?;

        match row {
            Some((id, user_id, expires_at_str, created_at_str)) => Ok(Some(Session {
                id,
                user_id,
                expires_at: parse_datetime(&expires_at_str)?,
                created_at: parse_datetime(&created_at_str)?,
            })),
            None => Ok(None),
        }
    }

    pub async fn delete_expired(&self) -> Result<u64> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < ?
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?
            .rows_affected();

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Session not found"));
        }

        Ok(())
    }
}
