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
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use marquee_core::models::{
    setting::{parse_bool, MediaReference, SettingKind, SettingValue, MAINTENANCE_MODE_KEY},
    user::User,
};
use marquee_db::repositories::MediaRepository;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tera::Context;

use crate::{
    auth::RequireAdmin,
    error::AppError,
    template_context::{add_base_context, render},
    AppState,
};

/// Keys the settings form exposes, in display order
pub const EDITABLE_KEYS: &[&str] = &[
    "site_name",
    "site_tagline",
    "contact_email",
    "contact_phone",
    "logo_light",
    "logo_dark",
    "favicon",
    "home_hero",
    "og_image",
];

#[derive(Debug, Serialize)]
struct SettingField {
    key: &'static str,
    kind: SettingKind,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    #[serde(default)]
    pub saved: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceForm {
    pub enabled: String,
}

async fn settings_page(
    state: &AppState,
    user: &User,
    saved: bool,
    error: Option<&str>,
) -> Result<Html<String>, AppError> {
    let mut fields = Vec::with_capacity(EDITABLE_KEYS.len());
    for &key in EDITABLE_KEYS {
        fields.push(SettingField {
            key,
            kind: SettingKind::for_key(key),
            value: state.settings.get(key, "").await,
        });
    }

    let mut context = Context::new();
    add_base_context(&mut context, state, Some(user)).await;
    context.insert("fields", &fields);
    context.insert(
        "maintenance_mode",
        &state.settings.get_bool(MAINTENANCE_MODE_KEY, false).await,
    );
    context.insert("saved", &saved);
    if let Some(error) = error {
        context.insert("error", error);
    }

    render(state, "admin/settings.html", &context)
}

pub async fn settings_form(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<SettingsQuery>,
) -> Result<Html<String>, AppError> {
    settings_page(&state, &user, query.saved.is_some(), None).await
}

/// Turn one submitted field into the value to store. Media slots take the
/// id of an existing asset, or keep a literal path or URL as-is; a blank
/// slot clears it.
async fn field_value(state: &AppState, key: &str, raw: &str) -> Result<SettingValue, String> {
    let raw = raw.trim();
    if SettingKind::for_key(key) != SettingKind::Media {
        return Ok(SettingValue::Text(raw.to_string()));
    }

    let id = match MediaReference::parse(raw) {
        None => return Ok(SettingValue::Text(String::new())),
        Some(MediaReference::Id(id)) => id,
        Some(literal) => return Ok(literal.into()),
    };
    match MediaRepository::new(state.db.clone()).find_by_id(id).await {
        Ok(Some(_)) => Ok(MediaReference::Id(id).into()),
        Ok(None) => Err(format!("{}: media {} does not exist", key, id)),
        Err(e) => {
            tracing::error!(key, media_id = id, error = %e, "Failed to look up media");
            Err(format!("{}: could not check media {}", key, id))
        }
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let mut values = Vec::new();
    for key in EDITABLE_KEYS {
        let Some(raw) = form.get(*key) else {
            continue;
        };
        match field_value(&state, key, raw).await {
            Ok(value) => values.push((key.to_string(), value)),
            Err(error) => {
                let html = settings_page(&state, &user, false, Some(&error)).await?;
                return Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response());
            }
        }
    }

    state.settings.set_many(&values).await?;
    tracing::info!(user = %user.username, count = values.len(), "Updated site settings");

    Ok(Redirect::to("/admin/settings?saved=1").into_response())
}

pub async fn toggle_maintenance(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<MaintenanceForm>,
) -> Result<Response, AppError> {
    let enabled = parse_bool(&form.enabled)
        .ok_or_else(|| AppError::bad_request(format!("Invalid value '{}'", form.enabled)))?;

    state.settings.set(MAINTENANCE_MODE_KEY, enabled).await?;
    tracing::info!(user = %user.username, enabled, "Maintenance mode changed");

    Ok(Redirect::to("/admin/settings").into_response())
}
