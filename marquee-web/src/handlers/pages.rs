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
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use marquee_core::models::{
    listing::ListingKind,
    media::ResolvedMedia,
    setting::MAINTENANCE_MODE_KEY,
};
use marquee_db::repositories::{ListingRepository, PageSectionRepository};
use serde::Serialize;
use serde_json::{json, Value};
use tera::Context;

use super::shared::{resolve_image, resolve_section_image};
use crate::{
    auth::OptionalUser,
    error::AppError,
    template_context::{add_base_context, render},
    AppState,
};

pub const HOME_PAGE: &str = "home";

#[derive(Debug, Serialize)]
struct SectionView {
    key: String,
    content: Value,
    image: Option<ResolvedMedia>,
}

#[derive(Debug, Serialize)]
struct ListingView {
    title: String,
    description: Option<String>,
    link_url: Option<String>,
    image: Option<ResolvedMedia>,
}

/// Home page built from its enabled sections
pub async fn home(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    let sections = PageSectionRepository::new(state.db.clone())
        .list_enabled_for_page(HOME_PAGE)
        .await?;

    let mut views = Vec::with_capacity(sections.len());
    for section in sections {
        let image = resolve_section_image(&state.db, &section.content).await;
        views.push(SectionView {
            key: section.section_key,
            content: section.content,
            image,
        });
    }

    let mut context = Context::new();
    add_base_context(&mut context, &state, user.as_ref().map(|u| &u.user)).await;
    context.insert("sections", &views);

    Ok(render(&state, "home.html", &context)?.into_response())
}

async fn listings(
    state: &AppState,
    user: Option<&crate::auth::CurrentUser>,
    kind: ListingKind,
    heading: &str,
) -> Result<Response, AppError> {
    let listings = ListingRepository::new(state.db.clone())
        .list_published(kind)
        .await?;

    let mut items = Vec::with_capacity(listings.len());
    for listing in listings {
        let image = resolve_image(&state.db, listing.image.as_deref()).await;
        items.push(ListingView {
            title: listing.title,
            description: listing.description,
            link_url: listing.link_url,
            image,
        });
    }

    let mut context = Context::new();
    add_base_context(&mut context, state, user.map(|u| &u.user)).await;
    context.insert("heading", heading);
    context.insert("items", &items);

    Ok(render(state, "listings.html", &context)?.into_response())
}

pub async fn rentals(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    listings(&state, user.as_ref(), ListingKind::Rental, "Rentals").await
}

pub async fn gallery(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    listings(&state, user.as_ref(), ListingKind::Gallery, "Gallery").await
}

pub async fn suppliers(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    listings(&state, user.as_ref(), ListingKind::Supplier, "Suppliers").await
}

/// 503 while maintenance mode is on; otherwise there is nothing to show
pub async fn maintenance_page(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    if !state.settings.get_bool(MAINTENANCE_MODE_KEY, false).await {
        return Ok(Redirect::to("/").into_response());
    }

    let mut context = Context::new();
    add_base_context(&mut context, &state, user.as_ref().map(|u| &u.user)).await;
    let html = render(&state, "maintenance.html", &context)?;

    Ok((
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::RETRY_AFTER, "300")],
        html,
    )
        .into_response())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::test_helpers::create_test_app_state;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use marquee_core::models::{
        listing::{Listing, ListingKind},
        media::Media,
        page_section::PageSection,
        setting::MAINTENANCE_MODE_KEY,
    };
    use marquee_db::repositories::{ListingRepository, MediaRepository, PageSectionRepository};
    use serde_json::json;

    #[tokio::test]
    async fn test_home_renders_enabled_sections() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let db = test.state.db.clone();

        let media = Media::new(
            "media/2025/04/hero.jpg".to_string(),
            "image/jpeg".to_string(),
            100,
        );
        let media_id = MediaRepository::new(db.clone()).create(&media).await?;

        let sections = PageSectionRepository::new(db.clone());
        let hero = PageSection::new(
            "home".to_string(),
            "hero".to_string(),
            json!({"title": "Tents for every occasion", "media_id": media_id}),
        );
        sections.upsert(&hero).await?;
        let mut hidden = PageSection::new(
            "home".to_string(),
            "promo".to_string(),
            json!({"title": "Summer sale"}),
        );
        hidden.is_enabled = false;
        sections.upsert(&hidden).await?;

        let server = TestServer::new(create_router(test.state.clone()))?;
        let response = server.get("/").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Tents for every occasion"));
        assert!(html.contains("hero.jpg"));
        assert!(!html.contains("Summer sale"));
        Ok(())
    }

    #[tokio::test]
    async fn test_rentals_show_published_listings() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let repo = ListingRepository::new(test.state.db.clone());

        let mut tent = Listing::new(ListingKind::Rental, "20x40 Frame Tent".to_string());
        tent.image = Some("uploads/tent.jpg".to_string());
        repo.create(&tent).await?;
        let mut draft = Listing::new(ListingKind::Rental, "Dance floor".to_string());
        draft.is_published = false;
        repo.create(&draft).await?;

        let server = TestServer::new(create_router(test.state.clone()))?;
        let response = server.get("/rentals").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("20x40 Frame Tent"));
        assert!(html.contains("tent.jpg"));
        assert!(!html.contains("Dance floor"));
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_page_status() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let response = server.get("/maintenance").await;
        response.assert_status(StatusCode::SEE_OTHER);

        test.state.settings.set(MAINTENANCE_MODE_KEY, true).await?;
        let response = server.get("/maintenance").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.text().contains("undergoing maintenance"));

        let response = server.get("/rentals").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/maintenance");
        Ok(())
    }

    #[tokio::test]
    async fn test_health_bypasses_maintenance() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        test.state.settings.set(MAINTENANCE_MODE_KEY, true).await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({"status": "ok"}));
        Ok(())
    }
}
