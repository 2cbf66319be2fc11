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

//! Matching rules deciding whether a stored value refers to a media asset.
//!
//! Path matching is deliberately loose: a value that merely *contains* the
//! asset path (a full URL with a domain, a `/storage/` prefixed link) counts
//! as a reference. An unrelated asset whose path happens to be a substring
//! of a stored value will be reported as in use; an asset that is really
//! used is never reported as free.

use crate::models::{content_tree::ContentNode, media::Media};

/// The identity a stored value can point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaIdentity<'a> {
    pub id: Option<i64>,
    pub path: Option<&'a str>,
}

impl<'a> From<&'a Media> for MediaIdentity<'a> {
    fn from(media: &'a Media) -> Self {
        Self {
            id: media.id,
            path: media.reference_path(),
        }
    }
}

/// A free-form value (setting value, image column) referencing the media
/// by id, exact path, or a string containing the path.
pub fn value_references(value: &str, media: &MediaIdentity<'_>) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }

    if let Some(id) = media.id {
        if trimmed.parse::<i64>().map(|v| v == id).unwrap_or(false) {
            return true;
        }
    }

    match media.path {
        Some(path) => trimmed == path || trimmed.contains(path),
        None => false,
    }
}

/// Structured content referencing the media by path anywhere in its
/// leaves, or by id under a media-id label.
pub fn content_references(content: &ContentNode, media: &MediaIdentity<'_>) -> bool {
    if let Some(path) = media.path {
        if content.contains_text(path) {
            return true;
        }
    }
    match media.id {
        Some(id) => content.contains_media_id(id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn media(id: i64, path: &str) -> Media {
        let mut media = Media::new(path.to_string(), "image/png".to_string(), 1);
        media.id = Some(id);
        media
    }

    #[test]
    fn test_value_matches_numeric_id() {
        let m = media(12, "logos/x.png");
        assert!(value_references("12", &(&m).into()));
        assert!(value_references(" 12 ", &(&m).into()));
        assert!(!value_references("120", &(&m).into()));
    }

    #[test]
    fn test_value_matches_exact_path() {
        let m = media(1, "logos/x.png");
        assert!(value_references("logos/x.png", &(&m).into()));
    }

    #[test]
    fn test_value_matches_full_url_containing_path() {
        let m = media(1, "logos/x.png");
        assert!(value_references(
            "https://example.com/storage/logos/x.png",
            &(&m).into()
        ));
    }

    #[test]
    fn test_value_substring_match_is_over_inclusive() {
        // "a.png" is a substring of "media/a.png.bak"; reported as used
        let m = media(1, "a.png");
        assert!(value_references("media/a.png.bak", &(&m).into()));
    }

    #[test]
    fn test_value_unrelated() {
        let m = media(1, "logos/x.png");
        assert!(!value_references("logos/y.png", &(&m).into()));
        assert!(!value_references("", &(&m).into()));
        assert!(!value_references("true", &(&m).into()));
    }

    #[test]
    fn test_blank_path_uses_id_only() {
        let m = media(9, "");
        let identity: MediaIdentity = (&m).into();
        assert_eq!(identity.path, None);
        assert!(value_references("9", &identity));
        // an empty path would otherwise be a substring of everything
        assert!(!value_references("anything", &identity));
    }

    #[test]
    fn test_content_references_path_and_id() {
        let m = media(4, "media/hero.jpg");
        let by_path = ContentNode::from_json(&json!({"blocks": [{"bg": "/storage/media/hero.jpg"}]}));
        let by_id = ContentNode::from_json(&json!({"hero_media_id": 4}));
        let unrelated = ContentNode::from_json(&json!({"count": 4, "text": "hero"}));
        assert!(content_references(&by_path, &(&m).into()));
        assert!(content_references(&by_id, &(&m).into()));
        assert!(!content_references(&unrelated, &(&m).into()));
    }
}
