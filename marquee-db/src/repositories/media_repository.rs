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
use marquee_core::models::media::{Media, MediaVariant};
use sqlx::SqlitePool;

use super::parse_datetime;

type MediaRow = (
    i64,
    String,
    Option<String>,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    String,
    String,
    String,
);

const SELECT_MEDIA: &str = r#"
    SELECT id, path, original_name, mime_type, size_bytes, width, height,
           variants, created_at, updated_at
    FROM media
"#;

pub struct MediaRepository {
    pool: SqlitePool,
}

impl MediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, media: &Media) -> Result<i64> {
        media.validate().map_err(|e| anyhow::anyhow!(e))?;

        let variants =
            serde_json::to_string(&media.variants).context("Failed to serialize variants")?;

        let result = sqlx::query(
            r#"
            INSERT INTO media (path, original_name, mime_type, size_bytes, width, height,
                               variants, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.path)
        .bind(&media.original_name)
        .bind(&media.mime_type)
        .bind(media.size_bytes)
        .bind(media.width.map(i64::from))
        .bind(media.height.map(i64::from))
        .bind(variants)
        .bind(media.created_at)
        .bind(media.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to create media")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Media>> {
        let row = sqlx::query_as::<_, MediaRow>(&format!("{} WHERE id = ?", SELECT_MEDIA))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find media by ID")?;

        row.map(row_to_media).transpose()
    }

    pub async fn find_by_path(&self, path: &str) -> Result<Option<Media>> {
        let row = sqlx::query_as::<_, MediaRow>(&format!("{} WHERE path = ?", SELECT_MEDIA))
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to find media by path")?;

        row.map(row_to_media).transpose()
    }

    /// Newest first
    pub async fn list_all(&self) -> Result<Vec<Media>> {
        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            "{} ORDER BY created_at DESC, id DESC",
            SELECT_MEDIA
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list media")?;

        rows.into_iter().map(row_to_media).collect()
    }

    pub async fn update_variants(&self, id: i64, variants: &[MediaVariant]) -> Result<()> {
        let encoded = serde_json::to_string(variants).context("Failed to serialize variants")?;

        let rows = sqlx::query(
            r#"
            UPDATE media
            SET variants = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(encoded)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update media variants")?
        .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Media not found"));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete media")?
            .rows_affected();

        if rows == 0 {
            return Err(anyhow::anyhow!("Media not found"));
        }
        Ok(())
    }
}

fn row_to_media(row: MediaRow) -> Result<Media> {
    let (
        id,
        path,
        original_name,
        mime_type,
        size_bytes,
        width,
        height,
        variants_json,
        created_at_str,
        updated_at_str,
    ) = row;

    // A corrupt variants column should not hide the original asset
    let variants: Vec<MediaVariant> = match serde_json::from_str(&variants_json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(media_id = id, error = %e, "Ignoring malformed media variants");
            Vec::new()
        }
    };

    Ok(Media {
        id: Some(id),
        path,
        original_name,
        mime_type,
        size_bytes,
        width: width.and_then(|w| u32::try_from(w).ok()),
        height: height.and_then(|h| u32::try_from(h).ok()),
        variants,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::connect_in_memory;
    use pretty_assertions::assert_eq;

    fn sample(path: &str) -> Media {
        let mut media = Media::new(path.to_string(), "image/jpeg".to_string(), 2048);
        media.original_name = Some("tent.jpg".to_string());
        media.width = Some(1600);
        media.height = Some(900);
        media
    }

    #[tokio::test]
    async fn test_create_and_find_by_id() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);

        let id = repo.create(&sample("media/2025/06/tent.jpg")).await?;
        assert!(id > 0);

        let found = repo.find_by_id(id).await?.unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.path, "media/2025/06/tent.jpg");
        assert_eq!(found.original_name.as_deref(), Some("tent.jpg"));
        assert_eq!(found.width, Some(1600));
        assert_eq!(found.height, Some(900));
        assert!(found.variants.is_empty());
        assert_eq!(found.url(), "/storage/media/2025/06/tent.jpg");
        Ok(())
    }

    #[tokio::test]
    async fn test_find_by_path() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);
        repo.create(&sample("logos/brand.png")).await?;

        assert!(repo.find_by_path("logos/brand.png").await?.is_some());
        assert!(repo.find_by_path("logos/other.png").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_path_rejected() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);
        repo.create(&sample("logos/brand.png")).await?;
        assert!(repo.create(&sample("logos/brand.png")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);
        assert!(repo.create(&sample("../etc/passwd")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_variants() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);
        let id = repo.create(&sample("media/a.jpg")).await?;

        let variants = vec![
            MediaVariant {
                name: "w480".to_string(),
                path: "media/a-480.jpg".to_string(),
                width: Some(480),
            },
            MediaVariant {
                name: "w960".to_string(),
                path: "media/a-960.jpg".to_string(),
                width: Some(960),
            },
        ];
        repo.update_variants(id, &variants).await?;

        let found = repo.find_by_id(id).await?.unwrap();
        assert_eq!(found.variants, variants);
        assert_eq!(
            found.srcset().as_deref(),
            Some("/storage/media/a-480.jpg 480w, /storage/media/a-960.jpg 960w, /storage/media/a.jpg 1600w")
        );

        assert!(repo.update_variants(999, &variants).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_variants_ignored() -> Result<()> {
        let pool = connect_in_memory().await?;
        let repo = MediaRepository::new(pool.clone());
        let id = repo.create(&sample("media/a.jpg")).await?;

        sqlx::query("UPDATE media SET variants = 'not json' WHERE id = ?")
            .bind(id)
            .execute(&pool)
            .await?;

        let found = repo.find_by_id(id).await?.unwrap();
        assert!(found.variants.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_delete() -> Result<()> {
        let repo = MediaRepository::new(connect_in_memory().await?);
        let a = repo.create(&sample("media/a.jpg")).await?;
        let b = repo.create(&sample("media/b.jpg")).await?;

        let all = repo.list_all().await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, Some(b));

        repo.delete(a).await?;
        assert!(repo.find_by_id(a).await?.is_none());
        assert!(repo.delete(a).await.is_err());
        Ok(())
    }
}
