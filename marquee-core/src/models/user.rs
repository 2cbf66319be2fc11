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

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$")
        .expect("static email pattern is valid")
});

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("static username pattern is valid"));

/// A staff account that can sign in to the admin area
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password: &str) -> Result<Self> {
        Self::validate_username(&username).map_err(|e| anyhow!("Invalid username: {}", e))?;
        Self::validate_email(&email).map_err(|e| anyhow!("Invalid email: {}", e))?;

        let now = Utc::now();
        Ok(Self {
            id: None,
            username,
            email,
            password_hash: Self::hash_password(password)?,
            is_active: true,
            is_admin: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn hash_password(password: &str) -> Result<String> {
        use argon2::password_hash::rand_core::OsRng;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password_hash = Self::hash_password(password)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Ok(false)` on a wrong password, `Err` only on a corrupt stored hash
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Only active admins may use the admin area
    pub fn can_administer(&self) -> bool {
        self.is_active && self.is_admin
    }

    pub fn validate_email(email: &str) -> Result<(), String> {
        if email.is_empty() {
            return Err("Email cannot be empty".to_string());
        }
        if email.len() > 255 {
            return Err("Email cannot exceed 255 characters".to_string());
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err("Invalid email format".to_string());
        }
        Ok(())
    }

    pub fn validate_username(username: &str) -> Result<(), String> {
        if username.len() < 3 {
            return Err("Username must be at least 3 characters".to_string());
        }
        if username.len() > 50 {
            return Err("Username cannot exceed 50 characters".to_string());
        }
        if !USERNAME_PATTERN.is_match(username) {
            return Err("Username must start with a letter and contain only letters, numbers, underscores, and hyphens".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "owner".to_string(),
            "owner@example.com".to_string(),
            "correct horse",
        )
        .unwrap()
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert_eq!(user.id, None);
        assert!(user.is_active);
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "correct horse");
    }

    #[test]
    fn test_verify_password() {
        let user = user();
        assert!(user.verify_password("correct horse").unwrap());
        assert!(!user.verify_password("wrong").unwrap());
    }

    #[test]
    fn test_verify_password_corrupt_hash() {
        let mut user = user();
        user.password_hash = "not-a-hash".to_string();
        assert!(user.verify_password("anything").is_err());
    }

    #[test]
    fn test_set_password() {
        let mut user = user();
        user.set_password("new secret").unwrap();
        assert!(user.verify_password("new secret").unwrap());
        assert!(!user.verify_password("correct horse").unwrap());
    }

    #[test]
    fn test_can_administer() {
        let mut user = user();
        assert!(!user.can_administer());
        user.is_admin = true;
        assert!(user.can_administer());
        user.is_active = false;
        assert!(!user.can_administer());
    }

    #[test]
    fn test_validate_email() {
        assert!(User::validate_email("a@example.com").is_ok());
        assert!(User::validate_email("").is_err());
        assert!(User::validate_email("no-at-sign").is_err());
        assert!(User::validate_email(".lead@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(User::validate_username("owner").is_ok());
        assert!(User::validate_username("ab").is_err());
        assert!(User::validate_username("1owner").is_err());
        assert!(User::validate_username("own er").is_err());
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        assert!(User::new("x".to_string(), "x@example.com".to_string(), "pw").is_err());
        assert!(User::new("owner".to_string(), "bad".to_string(), "pw").is_err());
    }
}
