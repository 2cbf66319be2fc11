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
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter allowing `per_minute` requests; zero is raised to one
pub fn create_rate_limiter(per_minute: u32) -> SharedRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

pub fn create_login_rate_limiter(max_attempts: u32) -> SharedRateLimiter {
    create_rate_limiter(max_attempts)
}

pub fn create_contact_rate_limiter(max_submissions: u32) -> SharedRateLimiter {
    create_rate_limiter(max_submissions)
}

/// Rate limits form submissions on the routes it is layered on. Only POST
/// requests consume the quota so the forms themselves stay reachable.
pub async fn post_rate_limit_middleware(
    State(limiter): State<SharedRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if request.method() != Method::POST {
        return Ok(next.run(request).await);
    }

    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_create_login_rate_limiter() {
        let limiter = create_login_rate_limiter(5);

        for _ in 0..5 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_create_rate_limiter_with_zero() {
        let limiter = create_contact_rate_limiter(0);

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    fn app(limiter: SharedRateLimiter) -> Router {
        Router::new()
            .route("/contact", get(|| async { "form" }).post(|| async { "sent" }))
            .route_layer(middleware::from_fn_with_state(
                limiter,
                post_rate_limit_middleware,
            ))
    }

    fn request(method: Method) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/contact")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_requests_are_limited() {
        let app = app(create_rate_limiter(1));

        let first = app.clone().oneshot(request(Method::POST)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(request(Method::POST)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_get_requests_are_not_limited() {
        let app = app(create_rate_limiter(1));

        for _ in 0..3 {
            let response = app.clone().oneshot(request(Method::GET)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
