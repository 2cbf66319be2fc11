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
use chrono::Duration;
use marquee_core::models::{
    session::{Session, SESSION_COOKIE},
    user::User,
};
use marquee_db::{
    connect_in_memory,
    repositories::{SessionRepository, UserRepository},
};
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;

use crate::{configuration::Configuration, templates::init_templates, AppState};

pub const TEST_PASSWORD: &str = "password123";

/// App state over an in-memory database, with storage and templates in a
/// temporary directory that lives as long as this value
pub struct TestApp {
    pub state: AppState,
    pub dir: TempDir,
}

pub async fn create_test_app_state() -> Result<TestApp> {
    let dir = TempDir::new()?;
    let pool = connect_in_memory().await?;

    let mut config = Configuration::default();
    config.database_url = "sqlite::memory:".to_string();
    config.session.secure_cookies = false;
    config.upload.storage_dir = dir.path().join("storage").to_string_lossy().to_string();
    config.upload.variant_widths = vec![64];
    config.path.templates = dir.path().join("templates").to_string_lossy().to_string();
    config.path.static_dir = dir.path().join("static").to_string_lossy().to_string();
    config.rate_limit.login_attempts_per_minute = 100;
    config.rate_limit.contact_submissions_per_minute = 100;

    std::fs::create_dir_all(&config.upload.storage_dir)?;
    std::fs::create_dir_all(&config.path.static_dir)?;
    let templates = init_templates(&config.path.templates, false)?;

    Ok(TestApp {
        state: AppState::new(pool, templates, config),
        dir,
    })
}

pub async fn create_test_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    is_admin: bool,
) -> Result<User> {
    let mut user = User::new(username.to_string(), email.to_string(), TEST_PASSWORD)?;
    user.is_admin = is_admin;

    let user_id = UserRepository::new(pool.clone()).create(&user).await?;
    user.id = Some(user_id);

    Ok(user)
}

/// Signs `user` in and returns the `Cookie` header value
pub async fn login_cookie(pool: &SqlitePool, user: &User) -> Result<String> {
    let user_id = user
        .id
        .ok_or_else(|| anyhow::anyhow!("User has no id"))?;
    let session = Session::new(user_id, Duration::hours(1));
    SessionRepository::new(pool.clone()).create(&session).await?;
    Ok(format!("{}={}", SESSION_COOKIE, session.id))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode test png");
    buf
}
