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

use crate::{
    handlers,
    maintenance::maintenance_gate_middleware,
    rate_limit::post_rate_limit_middleware,
    request_logging::request_logging_middleware,
    AppState,
};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let max_upload_size = state.config.upload.max_size;

    // Everything here answers to the maintenance gate
    let gated = Router::new()
        .route("/", get(handlers::home))
        .route("/rentals", get(handlers::rentals))
        .route("/gallery", get(handlers::gallery))
        .route("/suppliers", get(handlers::suppliers))
        .route("/maintenance", get(handlers::maintenance_page))
        .route(
            "/contact",
            get(handlers::contact_form)
                .post(handlers::submit_contact)
                .layer(middleware::from_fn_with_state(
                    state.contact_rate_limiter.clone(),
                    post_rate_limit_middleware,
                )),
        )
        .route(
            "/login",
            get(handlers::login_form)
                .post(handlers::login)
                .layer(middleware::from_fn_with_state(
                    state.login_rate_limiter.clone(),
                    post_rate_limit_middleware,
                )),
        )
        .route("/logout", get(handlers::logout).post(handlers::logout))
        // Admin
        .route(
            "/admin/settings",
            get(handlers::settings_form).post(handlers::update_settings),
        )
        .route("/admin/maintenance", post(handlers::toggle_maintenance))
        .route(
            "/admin/media",
            get(handlers::media_library).post(handlers::upload_media),
        )
        .route("/admin/media/{id}/delete", post(handlers::delete_media))
        .route("/admin/sections", get(handlers::list_sections))
        .route("/admin/sections/{page}/{key}", put(handlers::upsert_section))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            maintenance_gate_middleware,
        ));

    Router::new()
        .merge(gated)
        // Outside the gate
        .route("/health", get(handlers::health))
        .nest_service("/storage", ServeDir::new(&state.config.upload.storage_dir))
        .nest_service("/static", ServeDir::new(&state.config.path.static_dir))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_upload_size))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page not found")
}
