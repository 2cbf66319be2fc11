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

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::setting::MediaReference;

const MAX_PATH_LENGTH: usize = 255;
const MAX_PATH_DEPTH: usize = 6;

/// Public URL prefix under which the storage directory is served
pub const STORAGE_URL_PREFIX: &str = "/storage";

static VALID_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\-/\.]+$").expect("static media path pattern is valid")
});

/// A managed uploaded asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: Option<i64>,
    /// Storage-relative location, e.g. `media/2025/06/<uuid>.png`
    pub path: String,
    pub original_name: Option<String>,
    pub mime_type: String,
    pub size_bytes: i64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub variants: Vec<MediaVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A derived rendition of a media asset (e.g. a resized image)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaVariant {
    pub name: String,
    pub path: String,
    pub width: Option<u32>,
}

/// A media reference resolved for rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedMedia {
    pub media_id: Option<i64>,
    pub url: String,
    pub srcset: Option<String>,
}

impl Media {
    pub fn new(path: String, mime_type: String, size_bytes: i64) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            path,
            original_name: None,
            mime_type,
            size_bytes,
            width: None,
            height: None,
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Path usable for reference matching; `None` when blank
    pub fn reference_path(&self) -> Option<&str> {
        let trimmed = self.path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    pub fn url(&self) -> String {
        storage_url(&self.path)
    }

    /// `srcset` attribute built from the variants, smallest first. The
    /// original is included when its width is known.
    pub fn srcset(&self) -> Option<String> {
        let mut candidates: Vec<(u32, String)> = self
            .variants
            .iter()
            .filter_map(|v| v.width.map(|w| (w, storage_url(&v.path))))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        if let Some(width) = self.width {
            candidates.push((width, self.url()));
        }
        candidates.sort_by_key(|(w, _)| *w);
        candidates.dedup_by_key(|(w, _)| *w);

        Some(
            candidates
                .iter()
                .map(|(w, url)| format!("{} {}w", url, w))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    pub fn resolve(&self) -> ResolvedMedia {
        ResolvedMedia {
            media_id: self.id,
            url: self.url(),
            srcset: self.srcset(),
        }
    }

    /// All storage-relative files owned by this asset
    pub fn all_paths(&self) -> Vec<&str> {
        std::iter::once(self.path.as_str())
            .chain(self.variants.iter().map(|v| v.path.as_str()))
            .collect()
    }

    pub fn validate_path(path: &str) -> Result<(), String> {
        if path.is_empty() {
            return Err("Media path cannot be empty".to_string());
        }
        if path.len() > MAX_PATH_LENGTH {
            return Err(format!(
                "Media path cannot exceed {} characters",
                MAX_PATH_LENGTH
            ));
        }
        if path.contains("..") {
            return Err("Media path cannot contain '..'".to_string());
        }
        if path.starts_with('/') || path.starts_with('\\') {
            return Err("Media path cannot be absolute".to_string());
        }
        if !VALID_PATH.is_match(path) {
            return Err(
                "Media path may only contain letters, digits, underscores, hyphens, slashes, and dots"
                    .to_string(),
            );
        }
        if path.split('/').count() > MAX_PATH_DEPTH {
            return Err(format!("Media path depth cannot exceed {}", MAX_PATH_DEPTH));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        Self::validate_path(&self.path)?;
        for variant in &self.variants {
            Self::validate_path(&variant.path)?;
        }
        if self.mime_type.is_empty() {
            return Err("Media mime type cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Public URL for a storage-relative path
pub fn storage_url(path: &str) -> String {
    format!(
        "{}/{}",
        STORAGE_URL_PREFIX,
        path.trim().trim_start_matches('/')
    )
}

/// Normalize a legacy literal value into a servable URL.
///
/// - full URLs (`https://host/storage/x.png`, `//host/x.png`) keep only
///   their path (and query) so the asset is served same-origin
/// - values already rooted at `/` are returned unchanged
/// - `storage/x.png` gains a leading slash
/// - anything else is treated as storage-relative
pub fn normalize_media_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || trimmed.starts_with("//")
    {
        let absolute = if trimmed.starts_with("//") {
            format!("http:{}", trimmed)
        } else {
            trimmed.to_string()
        };
        let parsed = url::Url::parse(&absolute).ok()?;
        let path = parsed.path();
        if path.is_empty() || path == "/" {
            return None;
        }
        return Some(match parsed.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        });
    }

    if trimmed.starts_with('/') {
        return Some(trimmed.to_string());
    }

    let storage_relative = trimmed
        .strip_prefix("storage/")
        .unwrap_or(trimmed);
    Some(storage_url(storage_relative))
}

/// URL for a reference that does not need a registry lookup
pub fn literal_reference_url(reference: &MediaReference) -> Option<String> {
    match reference {
        MediaReference::Id(_) => None,
        MediaReference::Path(path) => normalize_media_url(path),
        MediaReference::Url(url) => normalize_media_url(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn media_with_variants() -> Media {
        let mut media = Media::new("media/2025/06/tent.jpg".to_string(), "image/jpeg".to_string(), 1000);
        media.id = Some(5);
        media.width = Some(2000);
        media.variants = vec![
            MediaVariant {
                name: "w960".to_string(),
                path: "media/2025/06/tent-960.jpg".to_string(),
                width: Some(960),
            },
            MediaVariant {
                name: "w480".to_string(),
                path: "media/2025/06/tent-480.jpg".to_string(),
                width: Some(480),
            },
        ];
        media
    }

    #[test]
    fn test_url() {
        let media = Media::new("logos/x.png".to_string(), "image/png".to_string(), 10);
        assert_eq!(media.url(), "/storage/logos/x.png");
    }

    #[test]
    fn test_srcset_orders_by_width() {
        let media = media_with_variants();
        assert_eq!(
            media.srcset().unwrap(),
            "/storage/media/2025/06/tent-480.jpg 480w, /storage/media/2025/06/tent-960.jpg 960w, /storage/media/2025/06/tent.jpg 2000w"
        );
    }

    #[test]
    fn test_srcset_none_without_variants() {
        let media = Media::new("logos/x.png".to_string(), "image/png".to_string(), 10);
        assert!(media.srcset().is_none());
    }

    #[test]
    fn test_reference_path_blank() {
        let media = Media::new("  ".to_string(), "image/png".to_string(), 0);
        assert!(media.reference_path().is_none());
    }

    #[test]
    fn test_all_paths() {
        let media = media_with_variants();
        assert_eq!(media.all_paths().len(), 3);
        assert_eq!(media.all_paths()[0], "media/2025/06/tent.jpg");
    }

    #[test]
    fn test_normalize_legacy_path() {
        assert_eq!(
            normalize_media_url("logos/x.png").as_deref(),
            Some("/storage/logos/x.png")
        );
        assert_eq!(
            normalize_media_url("storage/logos/x.png").as_deref(),
            Some("/storage/logos/x.png")
        );
        assert_eq!(
            normalize_media_url("/images/logo.png").as_deref(),
            Some("/images/logo.png")
        );
    }

    #[test]
    fn test_normalize_absolute_url_extracts_path() {
        assert_eq!(
            normalize_media_url("https://example.com/storage/logos/x.png").as_deref(),
            Some("/storage/logos/x.png")
        );
        assert_eq!(
            normalize_media_url("//cdn.example.com/storage/a.png?v=2").as_deref(),
            Some("/storage/a.png?v=2")
        );
        assert_eq!(normalize_media_url("https://example.com/"), None);
    }

    #[test]
    fn test_normalize_blank() {
        assert_eq!(normalize_media_url("  "), None);
    }

    #[test]
    fn test_validate_path() {
        assert!(Media::validate_path("media/2025/06/a.png").is_ok());
        assert!(Media::validate_path("").is_err());
        assert!(Media::validate_path("../etc/passwd").is_err());
        assert!(Media::validate_path("/etc/passwd").is_err());
        assert!(Media::validate_path("a b.png").is_err());
        assert!(Media::validate_path("a/b/c/d/e/f/g.png").is_err());
    }

    #[test]
    fn test_validate_checks_variants() {
        let mut media = media_with_variants();
        assert!(media.validate().is_ok());
        media.variants[0].path = "../x.jpg".to_string();
        assert!(media.validate().is_err());
    }
}
