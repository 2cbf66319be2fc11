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

const MAX_KEY_LENGTH: usize = 100;

/// Key of the flag read by the maintenance gate
pub const MAINTENANCE_MODE_KEY: &str = "maintenance_mode";

/// Slot names whose keys hold a media reference, either as the whole key or
/// as a `_<slot>` suffix (e.g. `home_hero`, `footer_logo`).
pub const MEDIA_SLOTS: &[&str] = &[
    "logo",
    "logo_light",
    "logo_dark",
    "favicon",
    "image",
    "background",
    "og_image",
    "hero",
];

/// A persisted configuration value. The raw value is text; its meaning
/// comes from the key convention (see [`SettingKind`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// How a key's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKind {
    Flag,
    Media,
    Text,
}

impl SettingKind {
    pub fn for_key(key: &str) -> Self {
        if key == MAINTENANCE_MODE_KEY {
            return SettingKind::Flag;
        }
        let is_media_slot = MEDIA_SLOTS.iter().any(|slot| {
            key == *slot
                || key
                    .strip_suffix(slot)
                    .map(|prefix| prefix.ends_with('_'))
                    .unwrap_or(false)
        });
        if is_media_slot {
            SettingKind::Media
        } else {
            SettingKind::Text
        }
    }
}

/// Reference to a media asset as stored in a setting value.
///
/// Managed assets are stored by numeric id. Values written before media was
/// managed hold a storage-relative path or a full URL; both must keep
/// resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaReference {
    Id(i64),
    Path(String),
    Url(String),
}

impl MediaReference {
    /// Interpret a raw stored value. Blank values are not a reference.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(id) = trimmed.parse::<i64>() {
            return Some(MediaReference::Id(id));
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || trimmed.starts_with("//")
        {
            return Some(MediaReference::Url(trimmed.to_string()));
        }
        Some(MediaReference::Path(trimmed.to_string()))
    }

    pub fn to_storage(&self) -> String {
        match self {
            MediaReference::Id(id) => id.to_string(),
            MediaReference::Path(path) => path.clone(),
            MediaReference::Url(url) => url.clone(),
        }
    }
}

/// Typed value written through the setting store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
    Media(MediaReference),
}

impl SettingValue {
    /// Text form persisted in the `value` column
    pub fn to_storage(&self) -> String {
        match self {
            SettingValue::Bool(true) => "true".to_string(),
            SettingValue::Bool(false) => "false".to_string(),
            SettingValue::Text(text) => text.clone(),
            SettingValue::Media(reference) => reference.to_storage(),
        }
    }

    /// Build a value for `key` from form input, following the key convention
    pub fn for_key(key: &str, raw: &str) -> Self {
        match SettingKind::for_key(key) {
            SettingKind::Flag => SettingValue::Bool(parse_bool(raw).unwrap_or(false)),
            SettingKind::Media => match MediaReference::parse(raw) {
                Some(reference) => SettingValue::Media(reference),
                None => SettingValue::Text(String::new()),
            },
            SettingKind::Text => SettingValue::Text(raw.to_string()),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<MediaReference> for SettingValue {
    fn from(value: MediaReference) -> Self {
        SettingValue::Media(value)
    }
}

/// Parse the common truthy/falsy encodings. Returns `None` for anything
/// else so callers can pick their own default.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Setting {
    pub fn new(key: String, value: Option<String>) -> Self {
        Self {
            key,
            value,
            updated_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> SettingKind {
        SettingKind::for_key(&self.key)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Missing and unparseable values are `false`
    pub fn as_bool(&self) -> bool {
        self.value.as_deref().and_then(parse_bool).unwrap_or(false)
    }

    pub fn as_media_reference(&self) -> Option<MediaReference> {
        self.value.as_deref().and_then(MediaReference::parse)
    }

    pub fn validate_key(key: &str) -> Result<(), String> {
        if key.is_empty() {
            return Err("Setting key cannot be empty".to_string());
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(format!(
                "Setting key cannot exceed {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
        {
            return Err(
                "Setting key may only contain lowercase letters, digits, underscores and dots"
                    .to_string(),
            );
        }
        Ok(())
    }
}
