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

//! TOML configuration parser for Marquee
//!
//! Reads configuration files from the standard locations. Every field is
//! optional so a file may set only what it needs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Raw TOML configuration mirroring [`super::Configuration`] with every
/// field optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(flatten)]
    pub server: Option<TomlServerConfig>,
    #[serde(flatten)]
    pub session: Option<TomlSessionConfig>,
    #[serde(flatten)]
    pub upload: Option<TomlUploadConfig>,
    #[serde(flatten)]
    pub rate_limit: Option<TomlRateLimitConfig>,
    #[serde(flatten)]
    pub contact: Option<TomlContactConfig>,
    #[serde(flatten)]
    pub path: Option<TomlPathConfig>,
    pub database_url: Option<String>,
    pub development_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlSessionConfig {
    pub session_timeout_minutes: Option<i64>,
    pub secure_cookies: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlUploadConfig {
    pub max_upload_size: Option<usize>,
    pub storage_dir: Option<String>,
    pub variant_widths: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlRateLimitConfig {
    pub rate_limit_login_attempts: Option<u32>,
    pub rate_limit_contact_submissions: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlContactConfig {
    pub contact_min_submit_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlPathConfig {
    pub templates_dir: Option<String>,
    pub static_dir: Option<String>,
}

/// Parse a TOML configuration file if it exists
pub fn parse_toml_file<P: AsRef<Path>>(path: P) -> Result<TomlConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    let config: TomlConfig = toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse TOML configuration file: {}",
            path.display()
        )
    })?;

    Ok(config)
}

/// Standard configuration file paths, lowest precedence first
pub fn get_config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/marquee.conf")];

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".marquee.conf"));
    }

    paths.push(PathBuf::from("./marquee.toml"));

    paths
}

fn merge_option<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Merge configurations, later ones taking precedence field by field
pub fn merge_toml_configs(configs: Vec<TomlConfig>) -> TomlConfig {
    let mut merged = TomlConfig::default();

    for config in configs {
        if let Some(server) = config.server {
            let mut merged_server = merged.server.unwrap_or_default();
            merge_option(&mut merged_server.host, server.host);
            merge_option(&mut merged_server.port, server.port);
            merged.server = Some(merged_server);
        }

        if let Some(session) = config.session {
            let mut merged_session = merged.session.unwrap_or_default();
            merge_option(
                &mut merged_session.session_timeout_minutes,
                session.session_timeout_minutes,
            );
            merge_option(&mut merged_session.secure_cookies, session.secure_cookies);
            merged.session = Some(merged_session);
        }

        if let Some(upload) = config.upload {
            let mut merged_upload = merged.upload.unwrap_or_default();
            merge_option(&mut merged_upload.max_upload_size, upload.max_upload_size);
            merge_option(&mut merged_upload.storage_dir, upload.storage_dir);
            merge_option(&mut merged_upload.variant_widths, upload.variant_widths);
            merged.upload = Some(merged_upload);
        }

        if let Some(rate_limit) = config.rate_limit {
            let mut merged_rate_limit = merged.rate_limit.unwrap_or_default();
            merge_option(
                &mut merged_rate_limit.rate_limit_login_attempts,
                rate_limit.rate_limit_login_attempts,
            );
            merge_option(
                &mut merged_rate_limit.rate_limit_contact_submissions,
                rate_limit.rate_limit_contact_submissions,
            );
            merged.rate_limit = Some(merged_rate_limit);
        }

        if let Some(contact) = config.contact {
            let mut merged_contact = merged.contact.unwrap_or_default();
            merge_option(
                &mut merged_contact.contact_min_submit_seconds,
                contact.contact_min_submit_seconds,
            );
            merged.contact = Some(merged_contact);
        }

        if let Some(path) = config.path {
            let mut merged_path = merged.path.unwrap_or_default();
            merge_option(&mut merged_path.templates_dir, path.templates_dir);
            merge_option(&mut merged_path.static_dir, path.static_dir);
            merged.path = Some(merged_path);
        }

        merge_option(&mut merged.database_url, config.database_url);
        merge_option(&mut merged.development_mode, config.development_mode);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_toml_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file)?;

        let config = parse_toml_file(file.path())?;
        assert!(config.database_url.is_none());
        assert!(config.development_mode.is_none());

        Ok(())
    }

    #[test]
    fn test_parse_basic_toml_config() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
database_url = "sqlite:test.db"
development_mode = true
host = "127.0.0.1"
port = 8080
session_timeout_minutes = 720
storage_dir = "/srv/marquee/storage"
variant_widths = [320, 640]
contact_min_submit_seconds = 5
"#
        )?;

        let config = parse_toml_file(file.path())?;
        assert_eq!(config.database_url, Some("sqlite:test.db".to_string()));
        assert_eq!(config.development_mode, Some(true));

        let server = config.server.unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.port, Some(8080));

        let session = config.session.unwrap();
        assert_eq!(session.session_timeout_minutes, Some(720));

        let upload = config.upload.unwrap();
        assert_eq!(upload.storage_dir, Some("/srv/marquee/storage".to_string()));
        assert_eq!(upload.variant_widths, Some(vec![320, 640]));

        assert_eq!(config.contact.unwrap().contact_min_submit_seconds, Some(5));

        Ok(())
    }

    #[test]
    fn test_parse_nonexistent_file() -> Result<()> {
        let config = parse_toml_file("/nonexistent/path.toml")?;
        assert!(config.database_url.is_none());
        assert!(config.development_mode.is_none());

        Ok(())
    }

    #[test]
    fn test_parse_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml [[[").unwrap();

        let result = parse_toml_file(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse TOML"));
    }

    #[test]
    fn test_get_config_file_paths() {
        let paths = get_config_file_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/marquee.conf")));
        assert_eq!(paths.last(), Some(&PathBuf::from("./marquee.toml")));
    }

    #[test]
    fn test_merge_toml_configs() {
        let config1 = TomlConfig {
            database_url: Some("sqlite:db1.db".to_string()),
            server: Some(TomlServerConfig {
                host: Some("127.0.0.1".to_string()),
                port: Some(3000),
            }),
            rate_limit: Some(TomlRateLimitConfig {
                rate_limit_login_attempts: Some(5),
                rate_limit_contact_submissions: Some(2),
            }),
            ..Default::default()
        };

        let config2 = TomlConfig {
            database_url: Some("sqlite:db2.db".to_string()),
            server: Some(TomlServerConfig {
                host: None,
                port: Some(8080),
            }),
            rate_limit: Some(TomlRateLimitConfig {
                rate_limit_login_attempts: None,
                rate_limit_contact_submissions: Some(10),
            }),
            development_mode: Some(true),
            ..Default::default()
        };

        let merged = merge_toml_configs(vec![config1, config2]);

        assert_eq!(merged.database_url, Some("sqlite:db2.db".to_string()));
        assert_eq!(merged.development_mode, Some(true));

        let server = merged.server.unwrap();
        assert_eq!(server.host, Some("127.0.0.1".to_string()));
        assert_eq!(server.port, Some(8080));

        let rate_limit = merged.rate_limit.unwrap();
        assert_eq!(rate_limit.rate_limit_login_attempts, Some(5));
        assert_eq!(rate_limit.rate_limit_contact_submissions, Some(10));
    }
}
