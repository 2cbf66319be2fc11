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
use serde_json::Value;

use crate::models::content_tree::ContentNode;

const MAX_NAME_LENGTH: usize = 50;
const MAX_CONTENT_SIZE: usize = 1_048_576;

/// A named block of structured content on a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSection {
    pub id: Option<i64>,
    pub page: String,
    pub section_key: String,
    pub content: Value,
    pub is_enabled: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PageSection {
    pub fn new(page: String, section_key: String, content: Value) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            page,
            section_key,
            content,
            is_enabled: true,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn content_tree(&self) -> ContentNode {
        ContentNode::from_json(&self.content)
    }

    fn validate_name(field: &str, name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err(format!("{} cannot be empty", field));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(format!(
                "{} cannot exceed {} characters",
                field, MAX_NAME_LENGTH
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(format!(
                "{} may only contain lowercase letters, digits, hyphens and underscores",
                field
            ));
        }
        Ok(())
    }

    pub fn validate_page(page: &str) -> Result<(), String> {
        Self::validate_name("Page name", page)
    }

    pub fn validate_section_key(key: &str) -> Result<(), String> {
        Self::validate_name("Section key", key)
    }

    pub fn validate_content(content: &Value) -> Result<(), String> {
        if !content.is_object() {
            return Err("Section content must be a JSON object".to_string());
        }
        if content.to_string().len() > MAX_CONTENT_SIZE {
            return Err("Section content cannot exceed 1MB when serialized".to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        Self::validate_page(&self.page)?;
        Self::validate_section_key(&self.section_key)?;
        Self::validate_content(&self.content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_section_defaults() {
        let section = PageSection::new("home".to_string(), "hero".to_string(), json!({}));
        assert!(section.is_enabled);
        assert_eq!(section.position, 0);
        assert_eq!(section.id, None);
    }

    #[test]
    fn test_validate() {
        let section = PageSection::new(
            "home".to_string(),
            "hero".to_string(),
            json!({"title": "Tents for every occasion"}),
        );
        assert!(section.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(PageSection::validate_page("").is_err());
        assert!(PageSection::validate_page("Home Page").is_err());
        assert!(PageSection::validate_section_key("hero-banner").is_ok());
        assert!(PageSection::validate_section_key(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_content_must_be_object() {
        assert!(PageSection::validate_content(&json!(["a"])).is_err());
        assert!(PageSection::validate_content(&json!("text")).is_err());
        assert!(PageSection::validate_content(&json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_content_tree() {
        let section = PageSection::new(
            "gallery".to_string(),
            "intro".to_string(),
            json!({"image": "media/a.png"}),
        );
        assert!(section.content_tree().contains_text("media/a.png"));
    }
}
