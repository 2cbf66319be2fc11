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

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use marquee_core::models::page_section::PageSection;
use marquee_db::repositories::PageSectionRepository;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{auth::RequireAdmin, error::AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SectionUpdate {
    pub content: Value,
    pub is_enabled: Option<bool>,
    pub position: Option<i32>,
}

pub async fn list_sections(
    State(state): State<AppState>,
    RequireAdmin(_user): RequireAdmin,
) -> Result<Json<Vec<PageSection>>, AppError> {
    let sections = PageSectionRepository::new(state.db.clone()).list_all().await?;
    Ok(Json(sections))
}

/// Creates or replaces the content of one section. Visibility and
/// position are kept unless the request sets them.
pub async fn upsert_section(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path((page, key)): Path<(String, String)>,
    Json(update): Json<SectionUpdate>,
) -> Result<Json<Value>, AppError> {
    let repo = PageSectionRepository::new(state.db.clone());

    let mut section = repo
        .find(&page, &key)
        .await?
        .unwrap_or_else(|| PageSection::new(page.clone(), key.clone(), Value::Null));
    section.content = update.content;
    section.updated_at = Utc::now();
    if let Some(enabled) = update.is_enabled {
        section.is_enabled = enabled;
    }
    if let Some(position) = update.position {
        section.position = position;
    }

    section.validate().map_err(AppError::unprocessable)?;

    let id = repo.upsert(&section).await?;
    tracing::info!(user = %user.username, page = %page, section = %key, "Saved page section");

    Ok(Json(json!({
        "id": id,
        "page": section.page,
        "section_key": section.section_key,
    })))
}
