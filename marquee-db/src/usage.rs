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

//! Media usage resolution.
//!
//! A media asset may only be deleted when no source refers to it. Sources
//! are checked in registration order and the first hit wins. A source that
//! cannot be read counts as a hit, so an asset is never deleted on the
//! strength of an incomplete scan.

use anyhow::Result;
use async_trait::async_trait;
use marquee_core::models::listing::ListingKind;
use marquee_core::models::media::Media;
use marquee_core::models::setting::SettingKind;
use marquee_core::usage::{content_references, value_references, MediaIdentity};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::repositories::{PageSectionRepository, SettingRepository};

/// Something that may hold references to media assets
#[async_trait]
pub trait MediaReferenceSource: Send + Sync {
    /// Label used when reporting a reference, e.g. `settings`
    fn name(&self) -> String;

    /// Location of the first reference found, if any
    async fn find(&self, media: &MediaIdentity<'_>) -> Result<Option<String>>;
}

/// Where a media asset is referenced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaUsage {
    pub source: String,
    pub location: String,
}

impl std::fmt::Display for MediaUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.source, self.location)
    }
}

#[derive(Clone, Default)]
pub struct MediaUsageResolver {
    sources: Vec<Arc<dyn MediaReferenceSource>>,
}

impl MediaUsageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings, then page sections, then the listing image columns
    pub fn with_default_sources(pool: SqlitePool) -> Self {
        let mut resolver = Self::new()
            .register(SettingsReferenceSource::new(pool.clone()))
            .register(PageSectionReferenceSource::new(pool.clone()));
        for kind in ListingKind::ALL {
            resolver = resolver.register(ColumnReferenceSource::for_listing(pool.clone(), kind));
        }
        resolver
    }

    pub fn register(mut self, source: impl MediaReferenceSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn find_reference(&self, media: &Media) -> Option<MediaUsage> {
        let identity = MediaIdentity::from(media);
        if identity.id.is_none() && identity.path.is_none() {
            return None;
        }

        for source in &self.sources {
            match source.find(&identity).await {
                Ok(Some(location)) => {
                    return Some(MediaUsage {
                        source: source.name(),
                        location,
                    })
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        source = %source.name(),
                        media_id = ?media.id,
                        error = %e,
                        "Reference source unavailable, treating media as in use"
                    );
                    return Some(MediaUsage {
                        source: source.name(),
                        location: "unavailable".to_string(),
                    });
                }
            }
        }
        None
    }

    pub async fn is_media_in_use(&self, media: &Media) -> bool {
        self.find_reference(media).await.is_some()
    }
}

/// Setting values: numeric id, exact path or any value containing the path.
/// Flag settings never reference media.
pub struct SettingsReferenceSource {
    pool: SqlitePool,
}

impl SettingsReferenceSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaReferenceSource for SettingsReferenceSource {
    fn name(&self) -> String {
        "settings".to_string()
    }

    async fn find(&self, media: &MediaIdentity<'_>) -> Result<Option<String>> {
        let settings = SettingRepository::new(self.pool.clone()).list_all().await?;
        Ok(settings.into_iter().find_map(|setting| {
            if setting.kind() == SettingKind::Flag {
                return None;
            }
            let value = setting.value.as_deref()?;
            value_references(value, media).then_some(setting.key)
        }))
    }
}

/// Page section content trees, enabled or not
pub struct PageSectionReferenceSource {
    pool: SqlitePool,
}

impl PageSectionReferenceSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaReferenceSource for PageSectionReferenceSource {
    fn name(&self) -> String {
        "page_sections".to_string()
    }

    async fn find(&self, media: &MediaIdentity<'_>) -> Result<Option<String>> {
        let sections = PageSectionRepository::new(self.pool.clone()).list_all().await?;
        Ok(sections.into_iter().find_map(|section| {
            content_references(&section.content_tree(), media)
                .then(|| format!("{}/{}", section.page, section.section_key))
        }))
    }
}

/// A table column holding a media id or a storage path directly
pub struct ColumnReferenceSource {
    pool: SqlitePool,
    table: String,
    column: String,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ColumnReferenceSource {
    pub fn new(pool: SqlitePool, table: &str, column: &str) -> Result<Self> {
        if !is_identifier(table) || !is_identifier(column) {
            return Err(anyhow::anyhow!(
                "Invalid reference column {}.{}",
                table,
                column
            ));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
            column: column.to_string(),
        })
    }

    pub fn for_listing(pool: SqlitePool, kind: ListingKind) -> Self {
        Self {
            pool,
            table: kind.table().to_string(),
            column: kind.image_column().to_string(),
        }
    }
}

#[async_trait]
impl MediaReferenceSource for ColumnReferenceSource {
    fn name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }

    async fn find(&self, media: &MediaIdentity<'_>) -> Result<Option<String>> {
        let id = media.id.map(|id| id.to_string());
        let path = media.path.map(str::trim).filter(|p| !p.is_empty());
        if id.is_none() && path.is_none() {
            return Ok(None);
        }

        // Same rule as setting values: exact id, or any value containing the path
        let sql = format!(
            "SELECT id FROM {table} \
             WHERE TRIM({column}) = ? \
                OR (? IS NOT NULL AND INSTR({column}, ?) > 0) \
             LIMIT 1",
            table = self.table,
            column = self.column,
        );
        let row = sqlx::query_as::<_, (i64,)>(&sql)
            .bind(id)
            .bind(path)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id,)| format!("id {}", id)))
    }
}
