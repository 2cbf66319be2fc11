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
use marquee_core::models::page_section::PageSection;
use serde_json::Value;
use sqlx::SqlitePool;

use super::parse_datetime;

type SectionRow = (i64, String, String, String, bool, i32, String, String);

const SELECT_SECTION: &str = r#"
    SELECT id, page, section_key, content, is_enabled, position, created_at, updated_at
    FROM page_sections
"#;

pub struct PageSectionRepository {
    pool: SqlitePool,
}

impl PageSectionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the section identified by `(page, section_key)`.
    /// Returns the row id.
    pub async fn upsert(&self, section: &PageSection) -> Result<i64> {
        section.validate().map_err(|e| anyhow::anyhow!(e))?;

        let content =
            serde_json::to_string(&section.content).context("Failed to serialize content")?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO page_sections (page, section_key, content, is_enabled, position,
                                       created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(page, section_key) DO UPDATE SET
                content = excluded.content,
                is_enabled = excluded.is_enabled,
                position = excluded.position,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&section.page)
        .bind(&section.section_key)
        .bind(content)
        .bind(section.is_enabled)
        .bind(section.position)
        .bind(section.created_at)
        .bind(section.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert page section")?;

        Ok(id)
    }

    pub async fn find(&self, page: &str, section_key: &str) -> Result<Option<PageSection>> {
        let row = sqlx::query_as::<_, SectionRow>(&format!(
            "{} WHERE page = ? AND section_key = ?",
            SELECT_SECTION
        ))
        .bind(page)
        .bind(section_key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find page section")?;

        row.map(row_to_section).transpose()
    }

    /// Enabled sections of a page in display order
    pub async fn list_enabled_for_page(&self, page: &str) -> Result<Vec<PageSection>> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "{} WHERE page = ? AND is_enabled = 1 ORDER BY position, id",
            SELECT_SECTION
        ))
        .bind(page)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list page sections")?;

        rows.into_iter().map(row_to_section).collect()
    }

    /// Every section on every page, enabled or not
    pub async fn list_all(&self) -> Result<Vec<PageSection>> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "{} ORDER BY page, position, id",
            SELECT_SECTION
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list all page sections")?;

        rows.into_iter().map(row_to_section).collect()
    }

    pub async fn set_enabled(&self, page: &str, section_key: &str, enabled: bool) -> Result<()> {
        let rows = sqlx::query(
            r#"
            UPDATE page_sections
            SET is_enabled = ?, updated_at = ?
            WHERE page = ? AND section_key = ?
            "#,
        )
        .bind(enabled)
        .bind(chrono::Utc::now())
        .bind(page)
        .bind(section_key)
        .execute(&self.pool)
        .await
        .context("Failed to update page section")?
        .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Page section not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, page: &str, section_key: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM page_sections WHERE page = ? AND section_key = ?")
            .bind(page)
            .bind(section_key)
            .execute(&self.pool)
            .await
            .context("Failed to delete page section")?
            .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Page section not found"));
        }
        Ok(())
    }
}

fn row_to_section(row: SectionRow) -> Result<PageSection> {
    let (id, page, section_key, content_str, is_enabled, position, created_at_str, updated_at_str) =
        row;

    // Keep unparseable content as a single text leaf so it can still be
    // searched for references.
    let content = match serde_json::from_str::<Value>(&content_str) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(section_id = id, error = %e, "Page section content is not valid JSON");
            Value::String(content_str)
        }
    };

    Ok(PageSection {
        id: Some(id),
        page,
        section_key,
        content,
        is_enabled,
        position,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}
