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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};

pub mod defaults;
pub mod parser;

/// Main configuration structure containing all sub-configurations
///
/// # Example
///
/// ```rust,no_run
/// use marquee_web::configuration::Configuration;
///
/// let config = Configuration::load().expect("Failed to load configuration");
///
/// println!("Server running on: {}", config.bind_addr());
/// println!("Media stored under: {}", config.upload.storage_dir);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Configuration {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub rate_limit: RateLimitConfig,
    pub contact: ContactConfig,
    pub path: PathConfig,
    pub database_url: String,
    pub development_mode: bool,
}

/// Server configuration for host and port settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Session management configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub timeout_minutes: i64,
    pub secure_cookies: bool,
}

/// Media upload and storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    pub max_size: usize,
    pub storage_dir: String,
    pub variant_widths: Vec<u32>,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub login_attempts_per_minute: u32,
    pub contact_submissions_per_minute: u32,
}

/// Contact form spam mitigation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContactConfig {
    /// Submissions arriving sooner than this after the form was rendered
    /// are dropped
    pub min_submit_seconds: i64,
}

/// Path configuration for templates and static assets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathConfig {
    pub templates: String,
    pub static_dir: String,
}

impl Default for Configuration {
    fn default() -> Self {
        let project_root = PathBuf::from(".");
        Self {
            server: ServerConfig {
                host: defaults::default_host(),
                port: defaults::default_port(),
            },
            session: SessionConfig {
                timeout_minutes: defaults::default_session_timeout_minutes(),
                secure_cookies: defaults::default_secure_cookies(),
            },
            upload: UploadConfig {
                max_size: defaults::default_max_upload_size(),
                storage_dir: defaults::default_storage_directory(),
                variant_widths: defaults::default_variant_widths(),
            },
            rate_limit: RateLimitConfig {
                login_attempts_per_minute: defaults::default_login_attempts_per_minute(),
                contact_submissions_per_minute: defaults::default_contact_submissions_per_minute(),
            },
            contact: ContactConfig {
                min_submit_seconds: defaults::default_contact_min_submit_seconds(),
            },
            path: PathConfig {
                templates: defaults::default_templates_directory(&project_root),
                static_dir: defaults::default_static_directory(&project_root),
            },
            database_url: defaults::default_database_url(),
            development_mode: defaults::default_development_mode(),
        }
    }
}

impl Configuration {
    /// Load configuration from configuration files and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. /etc/marquee.conf
    /// 3. ~/.marquee.conf
    /// 4. ./marquee.toml
    /// 5. Environment variables
    pub fn load() -> Result<Self> {
        let project_root = Self::find_project_root()?;

        let toml_config = Self::load_toml_config()?;

        let server = ServerConfig::load(&toml_config)?;
        let session = SessionConfig::load(&toml_config)?;
        let upload = UploadConfig::load(&toml_config)?;
        let rate_limit = RateLimitConfig::load(&toml_config)?;
        let contact = ContactConfig::load(&toml_config)?;
        let path = PathConfig::load(&project_root, &toml_config)?;

        let database_url = env::var("DATABASE_URL")
            .or_else(|_| {
                toml_config
                    .database_url
                    .clone()
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_database_url());

        let development_mode = env::var("DEVELOPMENT_MODE")
            .or_else(|_| {
                toml_config
                    .development_mode
                    .map(|b| b.to_string())
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_development_mode().to_string())
            .parse()
            .unwrap_or_else(|_| defaults::default_development_mode());

        Ok(Self {
            server,
            session,
            upload,
            rate_limit,
            contact,
            path,
            database_url,
            development_mode,
        })
    }

    /// Load and merge TOML configuration files from standard locations
    fn load_toml_config() -> Result<parser::TomlConfig> {
        let mut configs = Vec::new();

        for path in parser::get_config_file_paths() {
            match parser::parse_toml_file(&path) {
                Ok(config) => configs.push(config),
                Err(e) => {
                    tracing::debug!("Could not load config file {}: {}", path.display(), e);
                }
            }
        }

        Ok(parser::merge_toml_configs(configs))
    }

    /// Convert the current configuration to TOML format
    pub fn to_toml(&self) -> Result<String> {
        let toml_config = parser::TomlConfig {
            server: Some(parser::TomlServerConfig {
                host: Some(self.server.host.clone()),
                port: Some(self.server.port),
            }),
            session: Some(parser::TomlSessionConfig {
                session_timeout_minutes: Some(self.session.timeout_minutes),
                secure_cookies: Some(self.session.secure_cookies),
            }),
            upload: Some(parser::TomlUploadConfig {
                max_upload_size: Some(self.upload.max_size),
                storage_dir: Some(self.upload.storage_dir.clone()),
                variant_widths: Some(self.upload.variant_widths.clone()),
            }),
            rate_limit: Some(parser::TomlRateLimitConfig {
                rate_limit_login_attempts: Some(self.rate_limit.login_attempts_per_minute),
                rate_limit_contact_submissions: Some(
                    self.rate_limit.contact_submissions_per_minute,
                ),
            }),
            contact: Some(parser::TomlContactConfig {
                contact_min_submit_seconds: Some(self.contact.min_submit_seconds),
            }),
            path: Some(parser::TomlPathConfig {
                templates_dir: Some(self.path.templates.clone()),
                static_dir: Some(self.path.static_dir.clone()),
            }),
            database_url: Some(self.database_url.clone()),
            development_mode: Some(self.development_mode),
        };

        toml::to_string_pretty(&toml_config).context("Failed to serialize configuration to TOML")
    }

    /// Find the project root by looking for the workspace Cargo.toml
    fn find_project_root() -> Result<PathBuf> {
        let mut current_dir = env::current_dir().context("Failed to get current directory")?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                let content =
                    std::fs::read_to_string(&cargo_toml).context("Failed to read Cargo.toml")?;
                if content.contains("[workspace]") {
                    return Ok(current_dir);
                }
            }

            if !current_dir.pop() {
                break;
            }
        }

        env::current_dir().context("Failed to determine project root")
    }

    /// Get the server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn load(toml_config: &parser::TomlConfig) -> Result<Self> {
        let host = env::var("HOST")
            .or_else(|_| {
                toml_config
                    .server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_host());

        let port = env::var("PORT")
            .or_else(|_| {
                toml_config
                    .server
                    .as_ref()
                    .and_then(|s| s.port.map(|p| p.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_port().to_string())
            .parse()
            .context("Invalid PORT environment variable")?;

        Ok(Self { host, port })
    }
}

impl SessionConfig {
    fn load(toml_config: &parser::TomlConfig) -> Result<Self> {
        let timeout_minutes = env::var("SESSION_TIMEOUT_MINUTES")
            .or_else(|_| {
                toml_config
                    .session
                    .as_ref()
                    .and_then(|s| s.session_timeout_minutes.map(|t| t.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_session_timeout_minutes().to_string())
            .parse()
            .context("Invalid SESSION_TIMEOUT_MINUTES environment variable")?;

        let secure_cookies = env::var("SECURE_COOKIES")
            .or_else(|_| {
                toml_config
                    .session
                    .as_ref()
                    .and_then(|s| s.secure_cookies.map(|c| c.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_secure_cookies().to_string())
            .parse()
            .context("Invalid SECURE_COOKIES environment variable")?;

        Ok(Self {
            timeout_minutes,
            secure_cookies,
        })
    }
}

/// Parse a comma separated width list such as `480,960,1600`
fn parse_widths(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.parse::<u32>()
                .with_context(|| format!("Invalid variant width: {}", w))
        })
        .collect()
}

impl UploadConfig {
    fn load(toml_config: &parser::TomlConfig) -> Result<Self> {
        let max_size = env::var("MAX_UPLOAD_SIZE")
            .or_else(|_| {
                toml_config
                    .upload
                    .as_ref()
                    .and_then(|u| u.max_upload_size.map(|s| s.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_max_upload_size().to_string())
            .parse()
            .context("Invalid MAX_UPLOAD_SIZE environment variable")?;

        let storage_dir = env::var("STORAGE_DIR")
            .or_else(|_| {
                toml_config
                    .upload
                    .as_ref()
                    .and_then(|u| u.storage_dir.clone())
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_storage_directory());

        let variant_widths = match env::var("VARIANT_WIDTHS") {
            Ok(raw) => parse_widths(&raw).context("Invalid VARIANT_WIDTHS environment variable")?,
            Err(_) => toml_config
                .upload
                .as_ref()
                .and_then(|u| u.variant_widths.clone())
                .unwrap_or_else(defaults::default_variant_widths),
        };

        Ok(Self {
            max_size,
            storage_dir,
            variant_widths,
        })
    }

    pub fn storage_path(&self) -> &Path {
        Path::new(&self.storage_dir)
    }
}

impl RateLimitConfig {
    fn load(toml_config: &parser::TomlConfig) -> Result<Self> {
        let login_attempts_per_minute = env::var("RATE_LIMIT_LOGIN_ATTEMPTS")
            .or_else(|_| {
                toml_config
                    .rate_limit
                    .as_ref()
                    .and_then(|r| r.rate_limit_login_attempts.map(|a| a.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_login_attempts_per_minute().to_string())
            .parse()
            .context("Invalid RATE_LIMIT_LOGIN_ATTEMPTS environment variable")?;

        let contact_submissions_per_minute = env::var("RATE_LIMIT_CONTACT_SUBMISSIONS")
            .or_else(|_| {
                toml_config
                    .rate_limit
                    .as_ref()
                    .and_then(|r| r.rate_limit_contact_submissions.map(|a| a.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_contact_submissions_per_minute().to_string())
            .parse()
            .context("Invalid RATE_LIMIT_CONTACT_SUBMISSIONS environment variable")?;

        Ok(Self {
            login_attempts_per_minute,
            contact_submissions_per_minute,
        })
    }
}

impl ContactConfig {
    fn load(toml_config: &parser::TomlConfig) -> Result<Self> {
        let min_submit_seconds = env::var("CONTACT_MIN_SUBMIT_SECONDS")
            .or_else(|_| {
                toml_config
                    .contact
                    .as_ref()
                    .and_then(|c| c.contact_min_submit_seconds.map(|s| s.to_string()))
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_contact_min_submit_seconds().to_string())
            .parse()
            .context("Invalid CONTACT_MIN_SUBMIT_SECONDS environment variable")?;

        Ok(Self { min_submit_seconds })
    }
}

impl PathConfig {
    fn load(project_root: &Path, toml_config: &parser::TomlConfig) -> Result<Self> {
        let templates = env::var("TEMPLATES_DIR")
            .or_else(|_| {
                toml_config
                    .path
                    .as_ref()
                    .and_then(|p| p.templates_dir.clone())
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_templates_directory(project_root));

        let static_dir = env::var("STATIC_DIR")
            .or_else(|_| {
                toml_config
                    .path
                    .as_ref()
                    .and_then(|p| p.static_dir.clone())
                    .ok_or(env::VarError::NotPresent)
            })
            .unwrap_or_else(|_| defaults::default_static_directory(project_root));

        Ok(Self {
            templates,
            static_dir,
        })
    }
}
