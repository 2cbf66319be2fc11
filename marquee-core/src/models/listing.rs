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
use serde::{Deserialize, Serialize};

use crate::models::media::normalize_media_url;

/// The catalog tables shown on public pages. Each has one free-form image
/// column holding either a media id or a storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Rental,
    Supplier,
    Gallery,
}

impl ListingKind {
    pub const ALL: [ListingKind; 3] = [ListingKind::Rental, ListingKind::Supplier, ListingKind::Gallery];

    pub fn table(&self) -> &'static str {
        match self {
            ListingKind::Rental => "rentals",
            ListingKind::Supplier => "suppliers",
            ListingKind::Gallery => "gallery_items",
        }
    }

    pub fn image_column(&self) -> &'static str {
        match self {
            ListingKind::Rental => "image",
            ListingKind::Supplier => "logo",
            ListingKind::Gallery => "image",
        }
    }
}

/// A published entry in one of the catalog tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Option<i64>,
    pub kind: ListingKind,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(kind: ListingKind, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            kind,
            title,
            description: None,
            image: None,
            link_url: None,
            position: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Media id when the image column holds one
    pub fn image_media_id(&self) -> Option<i64> {
        self.image.as_deref().and_then(|raw| raw.trim().parse().ok())
    }

    /// URL for a literal image path; `None` for media ids and blanks
    pub fn literal_image_url(&self) -> Option<String> {
        match self.image_media_id() {
            Some(_) => None,
            None => self.image.as_deref().and_then(normalize_media_url),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Listing title cannot be empty".to_string());
        }
        if self.title.len() > 200 {
            return Err("Listing title cannot exceed 200 characters".to_string());
        }
        Ok(())
    }
}
