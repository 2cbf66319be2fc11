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

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use marquee_core::models::{
    setting::{SettingKind, MAINTENANCE_MODE_KEY},
    user::User,
};
use marquee_db::{
    repositories::{MediaRepository, UserRepository},
    MediaUsageResolver, SettingStore,
};
use sqlx::SqlitePool;
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee CLI tool for site administration")]
struct Cli {
    /// Database URL (defaults to $DATABASE_URL, then sqlite:marquee.db)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and run migrations
    Migrate,

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Read and write site settings
    Setting {
        #[command(subcommand)]
        command: SettingCommands,
    },

    /// Switch maintenance mode
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommands,
    },

    /// Inspect the media library
    Media {
        #[command(subcommand)]
        command: MediaCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Username
        username: String,
        /// Email address
        email: String,
        /// Make user an admin
        #[arg(long)]
        admin: bool,
        /// Password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },

    /// Change user password
    Password {
        /// Username or email
        user: String,
        /// New password (will prompt if not provided)
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum SettingCommands {
    /// Print a setting value
    Get { key: String },
    /// Store a setting value. Media slots take a media id.
    Set { key: String, value: String },
    /// Remove a setting
    Forget { key: String },
    /// List every stored setting
    List,
}

#[derive(Subcommand)]
enum MaintenanceCommands {
    On,
    Off,
    Status,
}

#[derive(Subcommand)]
enum MediaCommands {
    /// List uploaded media
    List,
    /// Show where a media asset is referenced
    Usage { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_db=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let database_url = cli.database_url.unwrap_or_else(|| {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:marquee.db".to_string())
    });

    let pool = marquee_db::init_database(&database_url)
        .await
        .with_context(|| format!("Failed to open database: {}", database_url))?;

    match cli.command {
        Commands::Migrate => {
            println!("Database at {} is up to date", database_url);
            Ok(())
        }
        Commands::User { command } => handle_user_command(command, pool).await,
        Commands::Setting { command } => handle_setting_command(command, pool).await,
        Commands::Maintenance { command } => handle_maintenance_command(command, pool).await,
        Commands::Media { command } => handle_media_command(command, pool).await,
    }
}

fn prompt_password(label: &str) -> Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    Ok(rpassword::read_password()?)
}

async fn find_user(repo: &UserRepository, user: &str) -> Result<User> {
    let found = if user.contains('@') {
        repo.find_by_email(user).await?
    } else {
        repo.find_by_username(user).await?
    };
    found.ok_or_else(|| anyhow!("User not found: {}", user))
}

async fn handle_user_command(command: UserCommands, pool: SqlitePool) -> Result<()> {
    let user_repo = UserRepository::new(pool);

    match command {
        UserCommands::Create {
            username,
            email,
            admin,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password("Password")?,
            };
            let user_id = create_user(&user_repo, username, email, &password, admin).await?;

            println!("User created successfully with ID: {}", user_id);
            if admin {
                println!("User has admin privileges");
            }
            Ok(())
        }

        UserCommands::Password { user, password } => {
            let mut found_user = find_user(&user_repo, &user).await?;
            let password = match password {
                Some(p) => p,
                None => prompt_password("New password")?,
            };

            found_user.set_password(&password)?;
            user_repo.update(&found_user).await?;

            println!("Password changed for {}", found_user.username);
            Ok(())
        }
    }
}

async fn create_user(
    repo: &UserRepository,
    username: String,
    email: String,
    password: &str,
    admin: bool,
) -> Result<i64> {
    let mut user = User::new(username, email, password)?;
    user.is_admin = admin;
    repo.create(&user).await.context("Failed to create user")
}

async fn handle_setting_command(command: SettingCommands, pool: SqlitePool) -> Result<()> {
    let settings = SettingStore::new(pool);

    match command {
        SettingCommands::Get { key } => {
            match settings.get_value(&key).await {
                Some(value) => println!("{}", value.to_storage()),
                None => println!("{} is not set", key),
            }
            Ok(())
        }
        SettingCommands::Set { key, value } => {
            set_setting(&settings, &key, &value).await?;
            println!("{} = {}", key, value);
            Ok(())
        }
        SettingCommands::Forget { key } => {
            if settings.forget(&key).await? {
                println!("Removed {}", key);
            } else {
                println!("{} was not set", key);
            }
            Ok(())
        }
        SettingCommands::List => {
            for setting in settings.all().await? {
                println!(
                    "{:<24} {:<6} {}",
                    setting.key,
                    format!("{:?}", setting.kind()).to_lowercase(),
                    setting.value.as_deref().unwrap_or("(null)")
                );
            }
            Ok(())
        }
    }
}

/// Media slots given a number go through the media check; any other value
/// is stored as typed.
async fn set_setting(settings: &SettingStore, key: &str, value: &str) -> Result<()> {
    if SettingKind::for_key(key) == SettingKind::Media {
        if let Ok(media_id) = value.trim().parse::<i64>() {
            return settings.set_media_id(key, media_id).await;
        }
    }
    settings.set(key, value).await
}

async fn handle_maintenance_command(command: MaintenanceCommands, pool: SqlitePool) -> Result<()> {
    let settings = SettingStore::new(pool);

    let enabled = match command {
        MaintenanceCommands::On => {
            settings.set(MAINTENANCE_MODE_KEY, true).await?;
            true
        }
        MaintenanceCommands::Off => {
            settings.set(MAINTENANCE_MODE_KEY, false).await?;
            false
        }
        MaintenanceCommands::Status => settings.get_bool(MAINTENANCE_MODE_KEY, false).await,
    };

    println!(
        "Maintenance mode is {}",
        if enabled { "on" } else { "off" }
    );
    Ok(())
}

async fn handle_media_command(command: MediaCommands, pool: SqlitePool) -> Result<()> {
    let repo = MediaRepository::new(pool.clone());

    match command {
        MediaCommands::List => {
            for media in repo.list_all().await? {
                println!(
                    "{:>6}  {:<40} {:>10} bytes  {}",
                    media.id.unwrap_or_default(),
                    media.path,
                    media.size_bytes,
                    media.mime_type
                );
            }
            Ok(())
        }
        MediaCommands::Usage { id } => {
            let media = repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| anyhow!("Media {} not found", id))?;

            match MediaUsageResolver::with_default_sources(pool)
                .find_reference(&media)
                .await
            {
                Some(usage) => println!("Media {} is in use by {}", id, usage),
                None => println!("Media {} is not referenced and can be deleted", id),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use marquee_core::models::media::Media;
    use marquee_db::connect_in_memory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["marquee", "setting", "set", "site_name", "Big Top"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Setting {
                command: SettingCommands::Set { .. }
            }
        ));

        let cli = Cli::try_parse_from(["marquee", "--database-url", "sqlite::memory:", "maintenance", "on"])
            .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));

        assert!(Cli::try_parse_from(["marquee", "maintenance", "soon"]).is_err());
    }

    #[tokio::test]
    async fn test_set_setting_checks_media_ids() -> Result<()> {
        let pool = connect_in_memory().await?;
        let settings = SettingStore::new(pool.clone());

        assert!(set_setting(&settings, "logo_light", "42").await.is_err());

        let media = Media::new("media/2025/04/logo.png".to_string(), "image/png".to_string(), 1);
        let id = MediaRepository::new(pool).create(&media).await?;
        set_setting(&settings, "logo_light", &id.to_string()).await?;
        assert_eq!(settings.get("logo_light", "").await, id.to_string());

        set_setting(&settings, "logo_dark", "uploads/dark.svg").await?;
        assert_eq!(settings.get("logo_dark", "").await, "uploads/dark.svg");
        Ok(())
    }

    #[tokio::test]
    async fn test_maintenance_commands() -> Result<()> {
        let pool = connect_in_memory().await?;
        let settings = SettingStore::new(pool.clone());

        handle_maintenance_command(MaintenanceCommands::On, pool.clone()).await?;
        assert!(settings.get_bool(MAINTENANCE_MODE_KEY, false).await);

        handle_maintenance_command(MaintenanceCommands::Off, pool).await?;
        assert!(!settings.get_bool(MAINTENANCE_MODE_KEY, true).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_and_find() -> Result<()> {
        let pool = connect_in_memory().await?;
        let repo = UserRepository::new(pool);

        create_user(
            &repo,
            "owner".to_string(),
            "owner@example.com".to_string(),
            "tent-poles-42",
            true,
        )
        .await?;

        let by_name = find_user(&repo, "owner").await?;
        let by_email = find_user(&repo, "owner@example.com").await?;
        assert_eq!(by_name.id, by_email.id);
        assert!(by_name.is_admin);
        assert!(find_user(&repo, "nobody").await.is_err());
        Ok(())
    }
}
