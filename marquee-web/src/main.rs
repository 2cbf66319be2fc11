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
use marquee_db::{init_database, repositories::SessionRepository};
use marquee_web::{
    configuration::Configuration, routes, state::AppState, templates::init_templates,
};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Configuration::load()?;
    info!("Starting Marquee web server");

    // Initialize database
    info!("Initializing database: {}", config.database_url);
    let db = init_database(&config.database_url).await?;

    // Initialize templates
    info!("Loading templates from: {}", config.path.templates);
    let templates = init_templates(&config.path.templates, config.development_mode)?;

    // Ensure file directories exist
    std::fs::create_dir_all(&config.upload.storage_dir)?;
    std::fs::create_dir_all(&config.path.static_dir)?;
    info!("Storage directory: {}", config.upload.storage_dir);

    tokio::spawn(sweep_expired_sessions(db.clone()));

    let bind_addr = config.bind_addr();
    let state = AppState::new(db, templates, config);
    let app = routes::create_router(state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn sweep_expired_sessions(db: SqlitePool) {
    let repo = SessionRepository::new(db);
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match repo.delete_expired().await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Failed to remove expired sessions"),
        }
    }
}
