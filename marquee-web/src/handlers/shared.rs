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

use marquee_core::models::{
    media::{literal_reference_url, ResolvedMedia},
    setting::MediaReference,
};
use marquee_db::repositories::MediaRepository;
use serde_json::Value;
use sqlx::SqlitePool;

/// Resolve a stored image reference (media id, storage path or URL) for
/// rendering. Unresolvable references render as no image.
pub async fn resolve_image(pool: &SqlitePool, raw: Option<&str>) -> Option<ResolvedMedia> {
    let reference = MediaReference::parse(raw?)?;

    match reference {
        MediaReference::Id(id) => match MediaRepository::new(pool.clone()).find_by_id(id).await {
            Ok(Some(media)) => Some(media.resolve()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(media_id = id, error = %e, "Failed to load media for rendering");
                None
            }
        },
        literal => literal_reference_url(&literal).map(|url| ResolvedMedia {
            media_id: None,
            url,
            srcset: None,
        }),
    }
}

/// Image of a page section: `media_id` wins over a literal `image`
pub async fn resolve_section_image(pool: &SqlitePool, content: &Value) -> Option<ResolvedMedia> {
    let media_id = match content.get("media_id") {
        Some(Value::Number(n)) => n.as_i64().map(|id| id.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    if let Some(resolved) = resolve_image(pool, media_id.as_deref()).await {
        return Some(resolved);
    }

    resolve_image(pool, content.get("image").and_then(Value::as_str)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::models::media::Media;
    use marquee_db::connect_in_memory;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_image_variants() -> anyhow::Result<()> {
        let pool = connect_in_memory().await?;
        let media = Media::new("media/2025/05/tent.jpg".to_string(), "image/jpeg".to_string(), 1);
        let id = MediaRepository::new(pool.clone()).create(&media).await?;

        let by_id = resolve_image(&pool, Some(&id.to_string())).await.unwrap();
        assert_eq!(by_id.url, "/storage/media/2025/05/tent.jpg");
        assert_eq!(by_id.media_id, Some(id));

        let by_path = resolve_image(&pool, Some("uploads/legacy.jpg")).await.unwrap();
        assert_eq!(by_path.url, "/storage/uploads/legacy.jpg");

        assert!(resolve_image(&pool, Some("12345")).await.is_none());
        assert!(resolve_image(&pool, Some("  ")).await.is_none());
        assert!(resolve_image(&pool, None).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_section_image() -> anyhow::Result<()> {
        let pool = connect_in_memory().await?;
        let media = Media::new("media/2025/05/hero.jpg".to_string(), "image/jpeg".to_string(), 1);
        let id = MediaRepository::new(pool.clone()).create(&media).await?;

        let content = json!({"media_id": id, "image": "old/hero.jpg"});
        let resolved = resolve_section_image(&pool, &content).await.unwrap();
        assert_eq!(resolved.url, "/storage/media/2025/05/hero.jpg");

        let content = json!({"media_id": 999, "image": "old/hero.jpg"});
        let resolved = resolve_section_image(&pool, &content).await.unwrap();
        assert_eq!(resolved.url, "/storage/old/hero.jpg");

        assert!(resolve_section_image(&pool, &json!({"title": "Hi"})).await.is_none());
        Ok(())
    }
}
