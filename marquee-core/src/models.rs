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

pub mod contact_message;
pub mod content_tree;
pub mod listing;
pub mod media;
pub mod page_section;
pub mod session;
pub mod setting;
pub mod user;

pub use contact_message::*;
pub use content_tree::*;
pub use listing::*;
pub use media::*;
pub use page_section::*;
pub use session::*;
pub use setting::*;
pub use user::*;
