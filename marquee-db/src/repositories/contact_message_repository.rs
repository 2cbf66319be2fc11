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
use chrono::NaiveDate;
use marquee_core::models::contact_message::ContactMessage;
use sqlx::SqlitePool;

use super::parse_datetime;

type MessageRow = (
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

pub struct ContactMessageRepository {
    pool: SqlitePool,
}

impl ContactMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, message: &ContactMessage) -> Result<i64> {
        message.validate().map_err(|e| anyhow::anyhow!(e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO contact_messages (name, email, phone, event_date, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(message.event_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&message.message)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to store contact message")?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent first
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, name, email, phone, event_date, message, created_at
            FROM contact_messages
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list contact messages")?;

        rows.into_iter().map(row_to_message).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count contact messages")?;
        Ok(count)
    }
}

fn row_to_message(row: MessageRow) -> Result<ContactMessage> {
    let (id, name, email, phone, event_date, message, created_at_str) = row;
    Ok(ContactMessage {
        id: Some(id),
        name,
        email,
        phone,
        event_date: event_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        message,
        created_at: parse_datetime(&created_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::connect_in_memory;

    fn message(name: &str) -> ContactMessage {
        ContactMessage::new(
            name.to_string(),
            "guest@example.com".to_string(),
            "Do you have a 10x20 tent in August?".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_list() -> Result<()> {
        let repo = ContactMessageRepository::new(connect_in_memory().await?);

        let mut first = message("Ann");
        first.event_date = NaiveDate::from_ymd_opt(2025, 8, 16);
        first.phone = Some("555-0100".to_string());
        repo.create(&first).await?;
        repo.create(&message("Ben")).await?;

        assert_eq!(repo.count().await?, 2);

        let recent = repo.list_recent(10).await?;
        assert_eq!(recent[0].name, "Ben");
        assert_eq!(recent[1].event_date, NaiveDate::from_ymd_opt(2025, 8, 16));
        assert_eq!(recent[1].phone.as_deref(), Some("555-0100"));

        assert_eq!(repo.list_recent(1).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_message_rejected() -> Result<()> {
        let repo = ContactMessageRepository::new(connect_in_memory().await?);

        let mut bad = message("Ann");
        bad.email = "not-an-email".to_string();
        assert!(repo.create(&bad).await.is_err());
        assert_eq!(repo.count().await?, 0);
        Ok(())
    }
}
