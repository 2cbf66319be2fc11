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

//! Default configuration values for Marquee
//!
//! Each function returns the default value for a specific configuration field.

use std::{env, path::Path, path::PathBuf};

// Server defaults
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    3000
}

// Session defaults
pub fn default_session_timeout_minutes() -> i64 {
    1440 // 24 hours
}

pub fn default_secure_cookies() -> bool {
    true
}

// Upload defaults
pub fn default_max_upload_size() -> usize {
    10_485_760 // 10MB
}

pub fn default_storage_directory() -> String {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".marquee").join("storage"))
        .unwrap_or_else(|_| PathBuf::from("/var/marquee/storage"))
        .to_string_lossy()
        .to_string()
}

/// Widths of the resized copies generated for each raster upload
pub fn default_variant_widths() -> Vec<u32> {
    vec![480, 960, 1600]
}

// Rate limit defaults
pub fn default_login_attempts_per_minute() -> u32 {
    5
}

pub fn default_contact_submissions_per_minute() -> u32 {
    3
}

// Contact form defaults
pub fn default_contact_min_submit_seconds() -> i64 {
    3
}

// Path defaults
pub fn default_templates_directory(project_root: &Path) -> String {
    project_root.join("templates").to_string_lossy().to_string()
}

pub fn default_static_directory(project_root: &Path) -> String {
    project_root.join("static").to_string_lossy().to_string()
}

// Database defaults
pub fn default_database_url() -> String {
    "sqlite:marquee.db".to_string()
}

// Development mode default
pub fn default_development_mode() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 3000);
    }

    #[test]
    fn test_session_defaults() {
        assert_eq!(default_session_timeout_minutes(), 1440);
        assert!(default_secure_cookies());
    }

    #[test]
    fn test_upload_defaults() {
        assert_eq!(default_max_upload_size(), 10_485_760);
        assert!(
            default_storage_directory().contains(".marquee")
                || default_storage_directory().contains("/var/marquee")
        );
        assert_eq!(default_variant_widths(), vec![480, 960, 1600]);
    }

    #[test]
    fn test_rate_limit_defaults() {
        assert_eq!(default_login_attempts_per_minute(), 5);
        assert_eq!(default_contact_submissions_per_minute(), 3);
        assert_eq!(default_contact_min_submit_seconds(), 3);
    }

    #[test]
    fn test_path_defaults() {
        let project_root = Path::new("/tmp/project");
        assert_eq!(
            default_templates_directory(project_root),
            "/tmp/project/templates"
        );
        assert_eq!(default_static_directory(project_root), "/tmp/project/static");
    }

    #[test]
    fn test_database_defaults() {
        assert_eq!(default_database_url(), "sqlite:marquee.db");
        assert!(!default_development_mode());
    }
}
