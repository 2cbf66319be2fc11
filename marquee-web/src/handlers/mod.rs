pub mod admin_media;
pub mod admin_sections;
pub mod admin_settings;
pub mod auth;
pub mod contact;
pub mod pages;
pub mod shared;

pub use admin_media::{delete_media, media_library, upload_media};
pub use admin_sections::{list_sections, upsert_section};
pub use admin_settings::{settings_form, toggle_maintenance, update_settings};
pub use auth::{login, login_form, logout};
pub use contact::{contact_form, submit_contact};
pub use pages::{gallery, health, home, maintenance_page, rentals, suppliers};
