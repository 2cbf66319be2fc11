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

//! Site configuration store.
//!
//! Readers never fail: a missing key, a malformed value or a storage error
//! all resolve to the caller's default. Writers return errors.

use anyhow::{Context, Result};
use marquee_core::models::media::{literal_reference_url, ResolvedMedia};
use marquee_core::models::setting::{parse_bool, MediaReference, Setting, SettingValue};
use sqlx::SqlitePool;

use crate::repositories::{upsert_setting, MediaRepository, SettingRepository};

/// Handle over the settings table; cheap to clone and pass around.
#[derive(Clone)]
pub struct SettingStore {
    pool: SqlitePool,
}

impl SettingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> SettingRepository {
        SettingRepository::new(self.pool.clone())
    }

    async fn raw(&self, key: &str) -> Option<Setting> {
        match self.repo().find(key).await {
            Ok(setting) => setting,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read setting, using default");
                None
            }
        }
    }

    /// Stored value, or `default` when the key is absent or NULL
    pub async fn get(&self, key: &str, default: &str) -> String {
        self.raw(key)
            .await
            .and_then(|s| s.value)
            .unwrap_or_else(|| default.to_string())
    }

    /// Typed view of a stored value, interpreted by the key's convention
    pub async fn get_value(&self, key: &str) -> Option<SettingValue> {
        let setting = self.raw(key).await?;
        let raw = setting.value?;
        Some(SettingValue::for_key(key, &raw))
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.raw(key).await.and_then(|s| s.value) else {
            return default;
        };
        match parse_bool(&raw) {
            Some(value) => value,
            None => {
                tracing::warn!(key, value = %raw, "Unparseable boolean setting, using default");
                default
            }
        }
    }

    pub async fn set(&self, key: &str, value: impl Into<SettingValue>) -> Result<()> {
        Setting::validate_key(key).map_err(|e| anyhow::anyhow!(e))?;
        let stored = value.into().to_storage();
        self.repo().upsert(key, Some(&stored)).await
    }

    /// Write several values atomically
    pub async fn set_many(&self, values: &[(String, SettingValue)]) -> Result<()> {
        for (key, _) in values {
            Setting::validate_key(key).map_err(|e| anyhow::anyhow!(e))?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin settings transaction")?;
        for (key, value) in values {
            upsert_setting(&mut *tx, key, Some(&value.to_storage())).await?;
        }
        tx.commit()
            .await
            .context("Failed to commit settings transaction")?;

        Ok(())
    }

    /// Store a media id under `key`. The media must exist.
    pub async fn set_media_id(&self, key: &str, media_id: i64) -> Result<()> {
        let media = MediaRepository::new(self.pool.clone())
            .find_by_id(media_id)
            .await?;
        if media.is_none() {
            return Err(anyhow::anyhow!("Media {} not found", media_id));
        }
        self.set(key, MediaReference::Id(media_id)).await
    }

    /// Returns whether the key existed
    pub async fn forget(&self, key: &str) -> Result<bool> {
        self.repo().delete(key).await
    }

    pub async fn all(&self) -> Result<Vec<Setting>> {
        self.repo().list_all().await
    }

    /// Resolve a media slot for rendering: the URL plus a `srcset` when the
    /// asset has variants.
    pub async fn get_media(&self, key: &str) -> Option<ResolvedMedia> {
        let reference = self.raw(key).await?.as_media_reference()?;

        match reference {
            MediaReference::Id(id) => {
                match MediaRepository::new(self.pool.clone()).find_by_id(id).await {
                    Ok(Some(media)) if media.reference_path().is_some() => Some(media.resolve()),
                    Ok(_) => {
                        tracing::debug!(key, media_id = id, "Setting points at missing media");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(key, media_id = id, error = %e, "Failed to load media");
                        None
                    }
                }
            }
            literal => literal_reference_url(&literal).map(|url| ResolvedMedia {
                media_id: None,
                url,
                srcset: None,
            }),
        }
    }

    /// URL for a media slot, or `fallback` when it cannot be resolved
    pub async fn get_media_url(&self, key: &str, fallback: &str) -> String {
        self.get_media(key)
            .await
            .map(|resolved| resolved.url)
            .unwrap_or_else(|| fallback.to_string())
    }
}
