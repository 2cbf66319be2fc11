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
use std::sync::{Arc, RwLock};
use tera::{Context, Tera};

/// A wrapper around Tera that can reload templates in development mode
pub enum TemplateEngine {
    /// Static templates loaded once at startup
    Static(Arc<Tera>),
    /// Reloadable templates that refresh on each render
    Reloadable {
        templates_dir: String,
        cached: Arc<RwLock<Tera>>,
    },
}

impl TemplateEngine {
    pub fn new(templates_dir: &str, development_mode: bool) -> Result<Self> {
        let tera = Self::create_tera_instance(templates_dir)?;
        if development_mode {
            tracing::info!("Template hot reload enabled (development mode)");
            Ok(Self::Reloadable {
                templates_dir: templates_dir.to_string(),
                cached: Arc::new(RwLock::new(tera)),
            })
        } else {
            tracing::info!("Templates loaded once (production mode)");
            Ok(Self::Static(Arc::new(tera)))
        }
    }

    fn create_tera_instance(templates_dir: &str) -> Result<Tera> {
        let pattern = format!("{}/**/*.html", templates_dir);
        Ok(Tera::new(&pattern)?)
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        match self {
            Self::Static(tera) => Ok(tera.render(template_name, context)?),
            Self::Reloadable {
                templates_dir,
                cached,
            } => {
                match Self::create_tera_instance(templates_dir) {
                    Ok(new_tera) => {
                        let mut guard = cached
                            .write()
                            .map_err(|_| anyhow!("Template cache lock poisoned"))?;
                        *guard = new_tera;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to reload templates: {}. Using cached version.", e);
                    }
                }
                let guard = cached
                    .read()
                    .map_err(|_| anyhow!("Template cache lock poisoned"))?;
                Ok(guard.render(template_name, context)?)
            }
        }
    }
}

impl Clone for TemplateEngine {
    fn clone(&self) -> Self {
        match self {
            Self::Static(tera) => Self::Static(Arc::clone(tera)),
            Self::Reloadable {
                templates_dir,
                cached,
            } => Self::Reloadable {
                templates_dir: templates_dir.clone(),
                cached: Arc::clone(cached),
            },
        }
    }
}
