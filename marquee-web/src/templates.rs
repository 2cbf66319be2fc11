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
use std::path::Path;

use crate::autoreload_templates::TemplateEngine;

pub fn init_templates(templates_dir: &str, development_mode: bool) -> Result<TemplateEngine> {
    std::fs::create_dir_all(templates_dir).context("Failed to create templates directory")?;

    create_default_templates(templates_dir)?;

    TemplateEngine::new(templates_dir, development_mode)
}

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}{{ site_name }}{% endblock %}</title>
    <link rel="icon" href="{{ favicon_url }}">
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            max-width: 960px;
            margin: 0 auto;
            padding: 20px;
            color: #333;
        }
        header {
            display: flex;
            align-items: center;
            justify-content: space-between;
            border-bottom: 1px solid #eee;
            padding-bottom: 10px;
            margin-bottom: 20px;
        }
        header img { max-height: 48px; }
        nav a {
            margin-right: 15px;
            text-decoration: none;
            color: #0066cc;
        }
        .auth-info { font-size: 0.9em; }
        .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 20px; }
        .grid img { width: 100%; height: auto; }
        footer {
            margin-top: 40px;
            padding-top: 20px;
            border-top: 1px solid #eee;
            font-size: 0.9em;
            color: #666;
        }
    </style>
    {% block head %}{% endblock %}
</head>
<body>
    <header>
        <a href="/">
            <picture>
                <source srcset="{{ logo_dark_url }}" media="(prefers-color-scheme: dark)">
                <img src="{{ logo_light_url }}" alt="{{ site_name }}">
            </picture>
        </a>
        <nav>
            <a href="/rentals">Rentals</a>
            <a href="/gallery">Gallery</a>
            <a href="/suppliers">Suppliers</a>
            <a href="/contact">Contact</a>
        </nav>
        {% if user %}
        <span class="auth-info">
            {{ user.username }}
            {% if user.is_admin %}| <a href="/admin/settings">Admin</a>{% endif %}
            | <form method="post" action="/logout" style="display: inline;"><button type="submit">Logout</button></form>
        </span>
        {% endif %}
    </header>

    <main>
        {% block content %}{% endblock %}
    </main>

    <footer>
        <p>&copy; {{ site_name }}</p>
    </footer>
</body>
</html>"#;

const HOME_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block content %}
{% if sections | length == 0 %}
<p>Welcome to {{ site_name }}.</p>
{% endif %}
{% for section in sections %}
<section id="{{ section.key }}">
    {% if section.content.title %}<h2>{{ section.content.title }}</h2>{% endif %}
    {% if section.image %}
    <img src="{{ section.image.url }}"{% if section.image.srcset %} srcset="{{ section.image.srcset }}"{% endif %} alt="{{ section.content.title | default(value='') }}">
    {% endif %}
    {% if section.content.body %}<p>{{ section.content.body }}</p>{% endif %}
</section>
{% endfor %}
{% endblock %}"#;

const LISTINGS_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}{{ heading }} - {{ super() }}{% endblock %}

{% block content %}
<h1>{{ heading }}</h1>
{% if items | length == 0 %}
<p>Nothing here yet.</p>
{% endif %}
<div class="grid">
{% for item in items %}
    <article>
        {% if item.image %}
        <img src="{{ item.image.url }}"{% if item.image.srcset %} srcset="{{ item.image.srcset }}"{% endif %} alt="{{ item.title }}">
        {% endif %}
        <h3>{% if item.link_url %}<a href="{{ item.link_url }}">{{ item.title }}</a>{% else %}{{ item.title }}{% endif %}</h3>
        {% if item.description %}<p>{{ item.description }}</p>{% endif %}
    </article>
{% endfor %}
</div>
{% endblock %}"#;

const CONTACT_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Contact - {{ super() }}{% endblock %}

{% block content %}
<h1>Contact us</h1>

{% if error %}
<p style="color: red;">{{ error }}</p>
{% endif %}

<form method="post" action="/contact">
    <input type="hidden" name="rendered_at" value="{{ rendered_at }}">
    <div style="position: absolute; left: -10000px;" aria-hidden="true">
        <label for="website">Website</label>
        <input type="text" id="website" name="website" tabindex="-1" autocomplete="off">
    </div>
    <p><label for="name">Name</label><br><input type="text" id="name" name="name" value="{{ form.name | default(value='') }}" required></p>
    <p><label for="email">Email</label><br><input type="email" id="email" name="email" value="{{ form.email | default(value='') }}" required></p>
    <p><label for="phone">Phone</label><br><input type="tel" id="phone" name="phone" value="{{ form.phone | default(value='') }}"></p>
    <p><label for="event_date">Event date</label><br><input type="date" id="event_date" name="event_date" value="{{ form.event_date | default(value='') }}"></p>
    <p><label for="message">Message</label><br><textarea id="message" name="message" rows="6" required>{{ form.message | default(value='') }}</textarea></p>
    <p><button type="submit">Send</button></p>
</form>
{% endblock %}"#;

const CONTACT_THANKS_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Thank you - {{ super() }}{% endblock %}

{% block content %}
<h1>Thank you</h1>
<p>We received your message and will get back to you shortly.</p>
<p><a href="/">Return to homepage</a></p>
{% endblock %}"#;

const MAINTENANCE_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Be right back - {{ super() }}{% endblock %}

{% block content %}
<h1>We'll be right back</h1>
<p>{{ site_name }} is undergoing maintenance. Please check back soon.</p>
{% endblock %}"#;

const LOGIN_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Login - {{ super() }}{% endblock %}

{% block content %}
<h1>Login</h1>

{% if error %}
<p style="color: red;">{{ error }}</p>
{% endif %}

<form method="post" action="/login">
    <p><label for="username">Username or Email</label><br><input type="text" id="username" name="username" required></p>
    <p><label for="password">Password</label><br><input type="password" id="password" name="password" required></p>
    <p><button type="submit">Login</button></p>
</form>
{% endblock %}"#;

const ADMIN_SETTINGS_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Settings - {{ super() }}{% endblock %}

{% block content %}
<h1>Site settings</h1>
<p><a href="/admin/media">Media library</a></p>

{% if error %}
<p style="color: red;">{{ error }}</p>
{% endif %}
{% if saved %}
<p style="color: green;">Settings saved.</p>
{% endif %}

<form method="post" action="/admin/settings">
{% for field in fields %}
    <p>
        <label for="{{ field.key }}">{{ field.key }}{% if field.kind == "Media" %} (media id){% endif %}</label><br>
        <input type="text" id="{{ field.key }}" name="{{ field.key }}" value="{{ field.value }}">
    </p>
{% endfor %}
    <p><button type="submit">Save</button></p>
</form>

<h2>Maintenance mode</h2>
<form method="post" action="/admin/maintenance">
    <input type="hidden" name="enabled" value="{% if maintenance_mode %}false{% else %}true{% endif %}">
    <p>Maintenance mode is <strong>{% if maintenance_mode %}on{% else %}off{% endif %}</strong>.
    <button type="submit">{% if maintenance_mode %}Turn off{% else %}Turn on{% endif %}</button></p>
</form>
{% endblock %}"#;

const ADMIN_MEDIA_TEMPLATE: &str = r#"{% extends "base.html" %}

{% block title %}Media - {{ super() }}{% endblock %}

{% block content %}
<h1>Media library</h1>
<p><a href="/admin/settings">Settings</a></p>

<form method="post" action="/admin/media" enctype="multipart/form-data">
    <input type="file" name="file" accept="image/*" required>
    <button type="submit">Upload</button>
</form>

<table>
    <thead><tr><th>ID</th><th>Preview</th><th>Name</th><th>Size</th><th>Used by</th><th></th></tr></thead>
    <tbody>
    {% for item in items %}
    <tr>
        <td>{{ item.media.id }}</td>
        <td><img src="{{ item.url }}" alt="" style="max-width: 120px;"></td>
        <td>{{ item.name }}</td>
        <td>{{ item.media.size_bytes }} bytes</td>
        <td>{% if item.usage %}{{ item.usage.source }} ({{ item.usage.location }}){% else %}-{% endif %}</td>
        <td>
            {% if not item.usage %}
            <form method="post" action="/admin/media/{{ item.media.id }}/delete"><button type="submit">Delete</button></form>
            {% endif %}
        </td>
    </tr>
    {% endfor %}
    </tbody>
</table>
{% endblock %}"#;

/// Templates written on first start, keyed by their path under the
/// templates directory
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("base.html", BASE_TEMPLATE),
    ("home.html", HOME_TEMPLATE),
    ("listings.html", LISTINGS_TEMPLATE),
    ("contact.html", CONTACT_TEMPLATE),
    ("contact_thanks.html", CONTACT_THANKS_TEMPLATE),
    ("maintenance.html", MAINTENANCE_TEMPLATE),
    ("login.html", LOGIN_TEMPLATE),
    ("admin/settings.html", ADMIN_SETTINGS_TEMPLATE),
    ("admin/media.html", ADMIN_MEDIA_TEMPLATE),
];

/// Writes every default template that is missing. Existing files are kept
/// so a site can override any of them.
fn create_default_templates(templates_dir: &str) -> Result<()> {
    let base_dir = Path::new(templates_dir);

    for (name, content) in DEFAULT_TEMPLATES {
        let path = base_dir.join(name);
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to create template {}", name))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tera::Context as TeraContext;

    fn base_context() -> TeraContext {
        let mut context = TeraContext::new();
        context.insert("site_name", "Big Top Rentals");
        context.insert("logo_light_url", "/static/images/logo-light.svg");
        context.insert("logo_dark_url", "/static/images/logo-dark.svg");
        context.insert("favicon_url", "/static/images/favicon.ico");
        context
    }

    #[test]
    fn test_init_writes_all_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let templates_dir = dir.path().to_str().unwrap();

        init_templates(templates_dir, false)?;

        for (name, _) in DEFAULT_TEMPLATES {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
        Ok(())
    }

    #[test]
    fn test_existing_templates_are_kept() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("maintenance.html"), "custom")?;

        let engine = init_templates(dir.path().to_str().unwrap(), false)?;
        assert_eq!(engine.render("maintenance.html", &base_context())?, "custom");
        Ok(())
    }

    #[test]
    fn test_defaults_render_with_base_context() -> Result<()> {
        let dir = TempDir::new()?;
        let engine = init_templates(dir.path().to_str().unwrap(), false)?;

        let html = engine.render("maintenance.html", &base_context())?;
        assert!(html.contains("Big Top Rentals is undergoing maintenance"));
        assert!(html.contains("favicon.ico"));

        let mut context = base_context();
        context.insert("sections", &Vec::<serde_json::Value>::new());
        let html = engine.render("home.html", &context)?;
        assert!(html.contains("Welcome to Big Top Rentals"));
        Ok(())
    }
}
