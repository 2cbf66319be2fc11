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

//! Maintenance gate policy.
//!
//! Decides per request whether traffic passes through or is sent to the
//! maintenance page. The rules are evaluated in order and the first match
//! wins:
//!
//! 1. maintenance flag off
//! 2. request for the maintenance page itself
//! 3. authenticated principal
//! 4. allow-listed authentication route
//!
//! Anything else is redirected.

use serde::Serialize;

/// Path of the maintenance page
pub const MAINTENANCE_PATH: &str = "/maintenance";

/// Authentication routes that stay reachable during maintenance so staff
/// can still sign in.
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    "/login",
    "/logout",
    "/register",
    "/forgot-password",
    "/reset-password",
    "/reset-password/*",
    "/two-factor-challenge",
    "/verify-email",
    "/verify-email/*",
    "/email/verification-notification",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassReason {
    MaintenanceOff,
    MaintenancePage,
    Authenticated,
    AllowListed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GateDecision {
    Pass(PassReason),
    Redirect(String),
}

impl GateDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateDecision::Pass(_))
    }
}

/// A route pattern: an exact path, or `prefix/*` matching one or more
/// further segments below `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    prefix: String,
    wildcard: bool,
}

impl RoutePattern {
    pub fn new(pattern: &str) -> Self {
        match pattern.strip_suffix("/*") {
            Some(prefix) => Self {
                prefix: normalize_path(prefix),
                wildcard: true,
            },
            None => Self {
                prefix: normalize_path(pattern),
                wildcard: false,
            },
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        if self.wildcard {
            path.strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| !rest.is_empty())
                .unwrap_or(false)
        } else {
            path == self.prefix
        }
    }
}

/// Drop a trailing slash (except for the root) so `/login/` and `/login`
/// compare equal.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct MaintenanceGate {
    maintenance_path: String,
    allow_list: Vec<RoutePattern>,
}

impl Default for MaintenanceGate {
    fn default() -> Self {
        Self::new(MAINTENANCE_PATH, DEFAULT_ALLOW_LIST)
    }
}

impl MaintenanceGate {
    pub fn new(maintenance_path: &str, allow_list: &[&str]) -> Self {
        Self {
            maintenance_path: normalize_path(maintenance_path),
            allow_list: allow_list.iter().map(|p| RoutePattern::new(p)).collect(),
        }
    }

    pub fn maintenance_path(&self) -> &str {
        &self.maintenance_path
    }

    pub fn is_allow_listed(&self, path: &str) -> bool {
        self.allow_list.iter().any(|pattern| pattern.matches(path))
    }

    pub fn decide(&self, maintenance_on: bool, path: &str, authenticated: bool) -> GateDecision {
        if !maintenance_on {
            return GateDecision::Pass(PassReason::MaintenanceOff);
        }
        if normalize_path(path) == self.maintenance_path {
            return GateDecision::Pass(PassReason::MaintenancePage);
        }
        if authenticated {
            return GateDecision::Pass(PassReason::Authenticated);
        }
        if self.is_allow_listed(path) {
            return GateDecision::Pass(PassReason::AllowListed);
        }
        GateDecision::Redirect(self.maintenance_path.clone())
    }
}
