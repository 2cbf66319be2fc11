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
use marquee_core::models::listing::{Listing, ListingKind};
use sqlx::SqlitePool;

use super::parse_datetime;

type ListingRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i32,
    bool,
    String,
    String,
);

/// Rentals, suppliers and gallery items share one shape; the table and the
/// image column come from the `ListingKind`.
pub struct ListingRepository {
    pool: SqlitePool,
}

fn select_sql(kind: ListingKind) -> String {
    format!(
        "SELECT id, title, description, {image} AS image, link_url, position, is_published, \
         created_at, updated_at FROM {table}",
        image = kind.image_column(),
        table = kind.table()
    )
}

impl ListingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, listing: &Listing) -> Result<i64> {
        listing.validate().map_err(|e| anyhow::anyhow!(e))?;

        let sql = format!(
            "INSERT INTO {} (title, description, {}, link_url, position, is_published, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            listing.kind.table(),
            listing.kind.image_column()
        );
        let result = sqlx::query(&sql)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.image)
            .bind(&listing.link_url)
            .bind(listing.position)
            .bind(listing.is_published)
            .bind(listing.created_at)
            .bind(listing.updated_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create {}", listing.kind.table()))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, kind: ListingKind, id: i64) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!("{} WHERE id = ?", select_sql(kind)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to find {} by ID", kind.table()))?;

        row.map(|r| row_to_listing(kind, r)).transpose()
    }

    /// Published entries in display order, for the public pages
    pub async fn list_published(&self, kind: ListingKind) -> Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} WHERE is_published = 1 ORDER BY position, id",
            select_sql(kind)
        ))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list {}", kind.table()))?;

        rows.into_iter().map(|r| row_to_listing(kind, r)).collect()
    }

    pub async fn list_all(&self, kind: ListingKind) -> Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} ORDER BY position, id",
            select_sql(kind)
        ))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to list {}", kind.table()))?;

        rows.into_iter().map(|r| row_to_listing(kind, r)).collect()
    }

    pub async fn update(&self, listing: &Listing) -> Result<()> {
        let id = listing
            .id
            .ok_or_else(|| anyhow::anyhow!("Listing has no ID"))?;
        listing.validate().map_err(|e| anyhow::anyhow!(e))?;

        let sql = format!(
            "UPDATE {} SET title = ?, description = ?, {} = ?, link_url = ?, position = ?, \
             is_published = ?, updated_at = ? WHERE id = ?",
            listing.kind.table(),
            listing.kind.image_column()
        );
        let rows = sqlx::query(&sql)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.image)
            .bind(&listing.link_url)
            .bind(listing.position)
            .bind(listing.is_published)
            .bind(chrono::Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update {}", listing.kind.table()))?
            .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Listing not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, kind: ListingKind, id: i64) -> Result<()> {
        let rows = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete from {}", kind.table()))?
            .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Listing not found"));
        }
        Ok(())
    }
}

fn row_to_listing(kind: ListingKind, row: ListingRow) -> Result<Listing> {
    let (
        id,
        title,
        description,
        image,
        link_url,
        position,
        is_published,
        created_at_str,
        updated_at_str,
    ) = row;
    Ok(Listing {
        id: Some(id),
        kind,
        title,
        description,
        image,
        link_url,
        position,
        is_published,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}
