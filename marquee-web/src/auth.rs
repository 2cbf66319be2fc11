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

use anyhow::Result;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use marquee_core::models::{
    session::{Session, SESSION_COOKIE},
    user::User,
};
use marquee_db::repositories::{SessionRepository, UserRepository};
use sqlx::SqlitePool;

/// Current authenticated user, extracted from request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session_id = session_id_from_headers(&parts.headers)
            .ok_or((StatusCode::UNAUTHORIZED, "No session found"))?;

        let pool = SqlitePool::from_ref(state);

        let session = SessionRepository::new(pool.clone())
            .find_by_id(&session_id)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid session"))?;

        if session.is_expired() {
            return Err((StatusCode::UNAUTHORIZED, "Session expired"));
        }

        let user = UserRepository::new(pool)
            .find_by_id(session.user_id)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Database error"))?
            .ok_or((StatusCode::UNAUTHORIZED, "User not found"))?;

        if !user.is_active {
            return Err((StatusCode::FORBIDDEN, "Account disabled"));
        }

        Ok(CurrentUser { user, session })
    }
}

/// Optional authenticated user
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err((StatusCode::UNAUTHORIZED, _)) | Err((StatusCode::FORBIDDEN, _)) => {
                Ok(OptionalUser(None))
            }
            Err(e) => Err(e),
        }
    }
}

/// Require admin user
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    SqlitePool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;

        if !user.can_administer() {
            return Err((StatusCode::FORBIDDEN, "Admin access required"));
        }

        Ok(RequireAdmin(user))
    }
}

/// Session id from the session cookie, then from a bearer token
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = CookieJar::from_headers(headers);
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

/// Whether the request carries a live session of an active user.
/// Lookup failures count as anonymous.
pub async fn is_authenticated(pool: &SqlitePool, headers: &HeaderMap) -> bool {
    let Some(session_id) = session_id_from_headers(headers) else {
        return false;
    };

    match lookup_active_user(pool, &session_id).await {
        Ok(user) => user.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, "Session lookup failed, treating request as anonymous");
            false
        }
    }
}

async fn lookup_active_user(pool: &SqlitePool, session_id: &str) -> Result<Option<User>> {
    let Some(session) = SessionRepository::new(pool.clone()).find_by_id(session_id).await? else {
        return Ok(None);
    };
    if session.is_expired() {
        return Ok(None);
    }

    let user = UserRepository::new(pool.clone())
        .find_by_id(session.user_id)
        .await?;
    Ok(user.filter(|u| u.is_active))
}
