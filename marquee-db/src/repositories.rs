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

pub mod contact_message_repository;
pub mod listing_repository;
pub mod media_repository;
pub mod page_section_repository;
pub mod session_repository;
pub mod setting_repository;
pub mod user_repository;

pub use contact_message_repository::*;
pub use listing_repository::*;
pub use media_repository::*;
pub use page_section_repository::*;
pub use session_repository::*;
pub use setting_repository::*;
pub use user_repository::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Parse a timestamp as written either by chrono (RFC3339) or by SQLite's
/// `datetime('now')`.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if s.contains('T') {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .context("Failed to parse datetime as RFC3339")
    } else {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.and_utc())
            .context("Failed to parse datetime as SQLite format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_sqlite_format() {
        let dt = parse_datetime("2025-06-01 12:30:45").unwrap();
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.second(), 45);
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_datetime("2025-06-01T12:30:45.123+00:00").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_datetime("yesterday").is_err());
    }
}
