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
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use marquee_core::{models::setting::MAINTENANCE_MODE_KEY, GateDecision};

use crate::{auth::is_authenticated, AppState};

/// Sends anonymous visitors to the maintenance page while the flag is on.
/// The session is only looked up when maintenance mode is enabled.
pub async fn maintenance_gate_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let maintenance_on = state.settings.get_bool(MAINTENANCE_MODE_KEY, false).await;
    let authenticated = maintenance_on && is_authenticated(&state.db, request.headers()).await;

    let path = request.uri().path();
    match state.gate.decide(maintenance_on, path, authenticated) {
        GateDecision::Pass(reason) => {
            if maintenance_on {
                tracing::debug!(path, ?reason, "Maintenance gate passed request");
            }
            next.run(request).await
        }
        GateDecision::Redirect(target) => {
            tracing::debug!(path, target = %target, "Maintenance gate redirected request");
            Redirect::to(&target).into_response()
        }
    }
}
