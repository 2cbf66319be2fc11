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

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::{NaiveDate, Utc};
use marquee_core::models::{contact_message::ContactMessage, user::User};
use marquee_db::repositories::ContactMessageRepository;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::{
    auth::OptionalUser,
    error::AppError,
    template_context::{add_base_context, render},
    AppState,
};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub message: String,
    /// Honeypot, left empty by people
    #[serde(default, skip_serializing)]
    pub website: Option<String>,
    #[serde(default, skip_serializing)]
    pub rendered_at: Option<String>,
}

impl ContactForm {
    fn filled_honeypot(&self) -> bool {
        self.website
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    /// Whether the form came back sooner than a person could fill it in.
    /// A missing or unreadable timestamp counts as too fast.
    fn submitted_too_fast(&self, min_seconds: i64, now: i64) -> bool {
        let Some(rendered_at) = self
            .rendered_at
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
        else {
            return true;
        };
        now.saturating_sub(rendered_at) < min_seconds
    }

    fn to_message(&self) -> Result<ContactMessage, String> {
        let mut message = ContactMessage::new(
            self.name.trim().to_string(),
            self.email.trim().to_string(),
            self.message.trim().to_string(),
        );

        let phone = self.phone.trim();
        if !phone.is_empty() {
            message.phone = Some(phone.to_string());
        }

        let event_date = self.event_date.trim();
        if !event_date.is_empty() {
            let date = NaiveDate::parse_from_str(event_date, "%Y-%m-%d")
                .map_err(|_| "Event date must look like 2025-06-21".to_string())?;
            message.event_date = Some(date);
        }

        message.validate()?;
        Ok(message)
    }
}

async fn contact_page(
    state: &AppState,
    user: Option<&User>,
    form: Option<&ContactForm>,
    error: Option<&str>,
) -> Result<Html<String>, AppError> {
    let mut context = Context::new();
    add_base_context(&mut context, state, user).await;
    context.insert("rendered_at", &Utc::now().timestamp());
    if let Some(form) = form {
        context.insert("form", form);
    }
    if let Some(error) = error {
        context.insert("error", error);
    }
    render(state, "contact.html", &context)
}

async fn thanks_page(state: &AppState, user: Option<&User>) -> Result<Response, AppError> {
    let mut context = Context::new();
    add_base_context(&mut context, state, user).await;
    Ok(render(state, "contact_thanks.html", &context)?.into_response())
}

pub async fn contact_form(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<Html<String>, AppError> {
    contact_page(&state, user.as_ref().map(|u| &u.user), None, None).await
}

/// Stores an inquiry. Bots get the same thank-you page as people so they
/// learn nothing from the response.
pub async fn submit_contact(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let user = user.as_ref().map(|u| &u.user);

    if form.filled_honeypot() {
        tracing::info!("Dropping contact submission with filled honeypot");
        return thanks_page(&state, user).await;
    }

    let min_seconds = state.config.contact.min_submit_seconds;
    if form.submitted_too_fast(min_seconds, Utc::now().timestamp()) {
        tracing::info!(min_seconds, "Dropping contact submission sent too quickly");
        return thanks_page(&state, user).await;
    }

    let message = match form.to_message() {
        Ok(message) => message,
        Err(error) => {
            let html = contact_page(&state, user, Some(&form), Some(&error)).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response());
        }
    };

    let id = ContactMessageRepository::new(state.db.clone())
        .create(&message)
        .await?;
    tracing::info!(id, email = %message.email, "Stored contact message");

    thanks_page(&state, user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::test_helpers::create_test_app_state;
    use axum_test::TestServer;

    fn form(rendered_at: i64) -> Vec<(&'static str, String)> {
        vec![
            ("name", "Dana".to_string()),
            ("email", "dana@example.com".to_string()),
            ("phone", "555-0100".to_string()),
            ("event_date", "2025-06-21".to_string()),
            ("message", "Do you have a 20x40 tent free?".to_string()),
            ("website", String::new()),
            ("rendered_at", rendered_at.to_string()),
        ]
    }

    fn an_hour_ago() -> i64 {
        Utc::now().timestamp() - 3600
    }

    #[test]
    fn test_submitted_too_fast() {
        let mut form = ContactForm {
            rendered_at: Some("1000".to_string()),
            ..Default::default()
        };
        assert!(form.submitted_too_fast(3, 1002));
        assert!(!form.submitted_too_fast(3, 1003));

        form.rendered_at = Some("yesterday".to_string());
        assert!(form.submitted_too_fast(3, 1003));
        form.rendered_at = None;
        assert!(form.submitted_too_fast(3, 1003));
    }

    #[test]
    fn test_to_message_parses_optional_fields() {
        let form = ContactForm {
            name: " Dana ".to_string(),
            email: "dana@example.com".to_string(),
            event_date: "2025-06-21".to_string(),
            message: "Hello".to_string(),
            ..Default::default()
        };
        let message = form.to_message().unwrap();
        assert_eq!(message.name, "Dana");
        assert_eq!(message.phone, None);
        assert_eq!(message.event_date, NaiveDate::from_ymd_opt(2025, 6, 21));

        let form = ContactForm {
            event_date: "next june".to_string(),
            ..form
        };
        assert!(form.to_message().is_err());
    }

    #[tokio::test]
    async fn test_contact_submission_is_stored() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let response = server.post("/contact").form(&form(an_hour_ago())).await;

        response.assert_status_ok();
        assert!(response.text().contains("Thank you"));
        let repo = ContactMessageRepository::new(test.state.db.clone());
        assert_eq!(repo.count().await?, 1);
        let stored = repo.list_recent(1).await?;
        assert_eq!(stored[0].phone.as_deref(), Some("555-0100"));
        Ok(())
    }

    #[tokio::test]
    async fn test_honeypot_submission_is_not_stored() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let mut fields = form(an_hour_ago());
        fields[5].1 = "http://spam.example".to_string();
        let response = server.post("/contact").form(&fields).await;

        response.assert_status_ok();
        assert!(response.text().contains("Thank you"));
        let repo = ContactMessageRepository::new(test.state.db.clone());
        assert_eq!(repo.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_fast_submission_is_not_stored() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let response = server
            .post("/contact")
            .form(&form(Utc::now().timestamp()))
            .await;

        response.assert_status_ok();
        let repo = ContactMessageRepository::new(test.state.db.clone());
        assert_eq!(repo.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_submission_rerenders_form() -> anyhow::Result<()> {
        let test = create_test_app_state().await?;
        let server = TestServer::new(create_router(test.state.clone()))?;

        let mut fields = form(an_hour_ago());
        fields[1].1 = "not-an-email".to_string();
        let response = server.post("/contact").form(&fields).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("Dana"));
        let repo = ContactMessageRepository::new(test.state.db.clone());
        assert_eq!(repo.count().await?, 0);
        Ok(())
    }
}
