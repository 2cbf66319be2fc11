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
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use marquee_core::models::media::Media;
use marquee_db::{repositories::MediaRepository, MediaUsage};
use serde::Serialize;
use tera::Context;

use crate::{
    auth::RequireAdmin,
    error::AppError,
    template_context::{add_base_context, render},
    AppState,
};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
struct MediaItem {
    media: Media,
    url: String,
    name: String,
    usage: Option<MediaUsage>,
}

fn display_name(media: &Media) -> String {
    media
        .original_name
        .clone()
        .unwrap_or_else(|| media.path.rsplit('/').next().unwrap_or_default().to_string())
}

pub async fn media_library(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> Result<Html<String>, AppError> {
    let media = MediaRepository::new(state.db.clone()).list_all().await?;

    let mut items = Vec::with_capacity(media.len());
    for media in media {
        let usage = state.media_usage.find_reference(&media).await;
        items.push(MediaItem {
            url: media.url(),
            name: display_name(&media),
            usage,
            media,
        });
    }

    let mut context = Context::new();
    add_base_context(&mut context, &state, Some(&user)).await;
    context.insert("items", &items);

    render(&state, "admin/media.html", &context)
}

pub async fn upload_media(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::new(e.status(), e.body_text()))?;

        if data.len() > state.config.upload.max_size {
            return Err(AppError::payload_too_large(format!(
                "File exceeds the {} byte upload limit",
                state.config.upload.max_size
            )));
        }
        upload = Some((data.to_vec(), file_name));
    }

    let (data, file_name) = upload.ok_or_else(|| AppError::bad_request("No file uploaded"))?;
    if data.is_empty() {
        return Err(AppError::bad_request("Uploaded file is empty"));
    }

    // Decoding and resizing are CPU bound
    let storage = state.storage.clone();
    let mut media = tokio::task::spawn_blocking(move || storage.store(&data, file_name.as_deref()))
        .await
        .map_err(|e| AppError::internal_server_error("Upload task failed").with_details(e.to_string()))?
        .map_err(|e| AppError::unprocessable("Unsupported or invalid image").with_details(e.to_string()))?;

    match MediaRepository::new(state.db.clone()).create(&media).await {
        Ok(id) => media.id = Some(id),
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&media) {
                tracing::warn!(path = %media.path, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    }

    tracing::info!(
        user = %user.username,
        media_id = ?media.id,
        path = %media.path,
        variants = media.variants.len(),
        "Uploaded media"
    );

    Ok(Redirect::to("/admin/media").into_response())
}

/// Deletes an asset nothing refers to. Referenced assets are refused with
/// 409 naming the first reference found.
pub async fn delete_media(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let repo = MediaRepository::new(state.db.clone());
    let media = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Media {} not found", id)))?;

    if let Some(usage) = state.media_usage.find_reference(&media).await {
        return Err(AppError::conflict(format!(
            "Media {} is in use by {}",
            id, usage
        )));
    }

    repo.delete(id).await?;
    if let Err(e) = state.storage.remove(&media) {
        tracing::warn!(media_id = id, error = %e, "Media row deleted but files remain");
    }

    tracing::info!(user = %user.username, media_id = id, path = %media.path, "Deleted media");

    Ok(Redirect::to("/admin/media").into_response())
}
