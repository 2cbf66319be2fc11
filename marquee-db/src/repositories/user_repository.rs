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
use marquee_core::models::user::User;
use sqlx::SqlitePool;

use super::parse_datetime;

type UserRow = (i64, String, String, String, bool, bool, String, String);

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, is_active, is_admin, created_at, updated_at
    FROM users
"#;

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, is_active, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by id")?;

        row.map(row_to_user).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = ?", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by email")?;

        row.map(row_to_user).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE username = ?", SELECT_USER))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find user by username")?;

        row.map(row_to_user).transpose()
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        let id = user.id.ok_or_else(|| anyhow::anyhow!("User has no ID"))?;

        let rows = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, is_active = ?, is_admin = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?
        .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("User not found"));
        }
        Ok(())
    }
}

fn row_to_user(row: UserRow) -> Result<User> {
    let (
        id,
        username,
        email,
        password_hash,
        is_active,
        is_admin,
        created_at_str,
        updated_at_str,
    ) = row;
    Ok(User {
        id: Some(id),
        username,
        email,
        password_hash,
        is_active,
        is_admin,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}
