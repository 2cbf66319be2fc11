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

use axum::response::Html;
use marquee_core::models::user::User;
use serde::Serialize;
use tera::Context;

use crate::{error::AppError, AppState};

pub const SITE_NAME_KEY: &str = "site_name";
pub const LOGO_LIGHT_KEY: &str = "logo_light";
pub const LOGO_DARK_KEY: &str = "logo_dark";
pub const FAVICON_KEY: &str = "favicon";

pub const DEFAULT_SITE_NAME: &str = "Marquee";
pub const DEFAULT_LOGO_LIGHT_URL: &str = "/static/images/logo-light.svg";
pub const DEFAULT_LOGO_DARK_URL: &str = "/static/images/logo-dark.svg";
pub const DEFAULT_FAVICON_URL: &str = "/static/images/favicon.ico";

/// What templates may know about the signed-in user
#[derive(Debug, Serialize)]
struct UserView<'a> {
    username: &'a str,
    is_admin: bool,
}

/// Branding shared by every page. Each lookup falls back on its own, so a
/// missing or broken setting never breaks rendering.
pub async fn add_base_context(context: &mut Context, state: &AppState, user: Option<&User>) {
    let settings = &state.settings;

    context.insert(
        "site_name",
        &settings.get(SITE_NAME_KEY, DEFAULT_SITE_NAME).await,
    );
    context.insert(
        "logo_light_url",
        &settings
            .get_media_url(LOGO_LIGHT_KEY, DEFAULT_LOGO_LIGHT_URL)
            .await,
    );
    context.insert(
        "logo_dark_url",
        &settings
            .get_media_url(LOGO_DARK_KEY, DEFAULT_LOGO_DARK_URL)
            .await,
    );
    context.insert(
        "favicon_url",
        &settings.get_media_url(FAVICON_KEY, DEFAULT_FAVICON_URL).await,
    );

    if let Some(user) = user {
        context.insert(
            "user",
            &UserView {
                username: &user.username,
                is_admin: user.can_administer(),
            },
        );
    }
}

pub fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>, AppError> {
    state
        .templates
        .render(template, context)
        .map(Html)
        .map_err(|e| {
            AppError::internal_server_error("Failed to render page")
                .with_details(format!("{}: {:?}", template, e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_app_state;
    use marquee_core::models::media::Media;
    use marquee_db::repositories::MediaRepository;

    #[tokio::test]
    async fn test_fallbacks_when_nothing_is_configured() -> anyhow::Result<()> {
        let app = create_test_app_state().await?;
        let mut context = Context::new();

        add_base_context(&mut context, &app.state, None).await;

        let json = context.into_json();
        assert_eq!(json["site_name"], DEFAULT_SITE_NAME);
        assert_eq!(json["logo_light_url"], DEFAULT_LOGO_LIGHT_URL);
        assert_eq!(json["logo_dark_url"], DEFAULT_LOGO_DARK_URL);
        assert_eq!(json["favicon_url"], DEFAULT_FAVICON_URL);
        assert!(json.get("user").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_branding() -> anyhow::Result<()> {
        let app = create_test_app_state().await?;
        let state = &app.state;

        let media = Media::new(
            "media/2025/01/logo.png".to_string(),
            "image/png".to_string(),
            10,
        );
        let media_id = MediaRepository::new(state.db.clone()).create(&media).await?;
        state.settings.set(SITE_NAME_KEY, "Big Top Rentals").await?;
        state.settings.set_media_id(LOGO_LIGHT_KEY, media_id).await?;
        state
            .settings
            .set(FAVICON_KEY, "https://cdn.example.com/storage/icons/fav.ico")
            .await?;
        // Points at a media row that does not exist
        state.settings.set(LOGO_DARK_KEY, "999").await?;

        let mut context = Context::new();
        add_base_context(&mut context, state, None).await;

        let json = context.into_json();
        assert_eq!(json["site_name"], "Big Top Rentals");
        assert_eq!(json["logo_light_url"], "/storage/media/2025/01/logo.png");
        assert_eq!(json["favicon_url"], "/storage/icons/fav.ico");
        assert_eq!(json["logo_dark_url"], DEFAULT_LOGO_DARK_URL);
        Ok(())
    }
}
