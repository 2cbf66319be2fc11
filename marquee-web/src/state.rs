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

use axum::extract::FromRef;
use marquee_core::MaintenanceGate;
use marquee_db::{MediaUsageResolver, SettingStore};
use sqlx::SqlitePool;

use crate::autoreload_templates::TemplateEngine;
use crate::configuration::Configuration;
use crate::rate_limit::{create_contact_rate_limiter, create_login_rate_limiter, SharedRateLimiter};
use crate::uploads::MediaStorage;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings: SettingStore,
    pub media_usage: MediaUsageResolver,
    pub gate: MaintenanceGate,
    pub storage: MediaStorage,
    pub templates: TemplateEngine,
    pub config: Configuration,
    pub login_rate_limiter: SharedRateLimiter,
    pub contact_rate_limiter: SharedRateLimiter,
}

impl AppState {
    /// Wires the stores and limiters for `db` from the configuration
    pub fn new(db: SqlitePool, templates: TemplateEngine, config: Configuration) -> Self {
        Self {
            settings: SettingStore::new(db.clone()),
            media_usage: MediaUsageResolver::with_default_sources(db.clone()),
            gate: MaintenanceGate::default(),
            storage: MediaStorage::new(
                &config.upload.storage_dir,
                config.upload.variant_widths.clone(),
            ),
            login_rate_limiter: create_login_rate_limiter(
                config.rate_limit.login_attempts_per_minute,
            ),
            contact_rate_limiter: create_contact_rate_limiter(
                config.rate_limit.contact_submissions_per_minute,
            ),
            db,
            templates,
            config,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for SettingStore {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}
