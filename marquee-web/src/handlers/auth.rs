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
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use chrono::Duration;
use cookie::SameSite;
use marquee_core::models::session::{Session, SESSION_COOKIE};
use marquee_db::repositories::{SessionRepository, UserRepository};
use serde::Deserialize;
use tera::Context;

use crate::{
    auth::OptionalUser,
    error::AppError,
    template_context::{add_base_context, render},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

async fn login_page(state: &AppState, error: Option<&str>) -> Result<Html<String>, AppError> {
    let mut context = Context::new();
    add_base_context(&mut context, state, None).await;
    if let Some(error) = error {
        context.insert("error", error);
    }
    render(state, "login.html", &context)
}

/// Display login form
pub async fn login_form(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    Ok(login_page(&state, None).await?.into_response())
}

/// Handle login POST request
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user_repo = UserRepository::new(state.db.clone());
    let user = if form.username.contains('@') {
        user_repo.find_by_email(&form.username).await?
    } else {
        user_repo.find_by_username(&form.username).await?
    };

    let user = match user {
        Some(u) if u.is_active => u,
        Some(_) => {
            let html = login_page(&state, Some("Account is disabled")).await?;
            return Ok((StatusCode::UNAUTHORIZED, html).into_response());
        }
        None => {
            let html = login_page(&state, Some("Invalid username or password")).await?;
            return Ok((StatusCode::UNAUTHORIZED, html).into_response());
        }
    };

    if !user.verify_password(&form.password)? {
        tracing::info!(username = %user.username, "Failed login attempt");
        let html = login_page(&state, Some("Invalid username or password")).await?;
        return Ok((StatusCode::UNAUTHORIZED, html).into_response());
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::internal_server_error("User has no id"))?;
    let session = Session::new(
        user_id,
        Duration::minutes(state.config.session.timeout_minutes),
    );
    SessionRepository::new(state.db.clone())
        .create(&session)
        .await?;

    tracing::info!(username = %user.username, "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session.id))
        .path("/")
        .http_only(true)
        .secure(state.config.session.secure_cookies)
        .same_site(SameSite::Lax)
        .build();

    let target = if user.can_administer() {
        "/admin/settings"
    } else {
        "/"
    };
    Ok((jar.add(cookie), Redirect::to(target)).into_response())
}

/// Handle logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_repo = SessionRepository::new(state.db.clone());
        if let Err(e) = session_repo.delete(session_cookie.value()).await {
            tracing::debug!(error = %e, "Logout without a stored session");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
