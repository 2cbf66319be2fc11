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

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::User;

const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactMessage {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn new(name: String, email: String, message: String) -> Self {
        Self {
            id: None,
            name,
            email,
            phone: None,
            event_date: None,
            message,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Please tell us your name".to_string());
        }
        if self.name.len() > 100 {
            return Err("Name cannot exceed 100 characters".to_string());
        }
        User::validate_email(&self.email)?;
        if self.message.trim().is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        if self.message.len() > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "Message cannot exceed {} characters",
                MAX_MESSAGE_LENGTH
            ));
        }
        Ok(())
    }
}
