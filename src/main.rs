//! CLI entry point for rest_loader.
//!
//! Provides subcommands for CRUD calls against the configured backend's
//! `/users` resource, and a dashboard that keeps a live user list loaded
//! and refreshes it on an interval.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use rest_loader::config::AppConfig;
use rest_loader::constants::APP_VERSION;
use rest_loader::fetch::auth::TokenStore;
use rest_loader::loader::{LoadState, Resource};
use rest_loader::services::{User, UserApi, UserFormData, UserPatch, UserService};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rest_loader")]
#[command(about = "Talk to a REST backend's /users resource", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// CRUD operations on users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Keep the user list loaded and refresh it periodically
    Dashboard {
        /// Number of manual refreshes after the initial load
        #[arg(short, long, default_value_t = 1)]
        refreshes: usize,

        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },
    /// Show application and backend settings
    About,
}

#[derive(Subcommand)]
enum UserAction {
    /// List all users
    List,
    /// Fetch one user
    Get {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Create a user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Update a user's name and/or email
    Update {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let config = AppConfig::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rest_loader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let tokens = TokenStore::new();
    let client = Arc::new(config.api_client(tokens)?);
    let service = UserService::new(client);

    match cli.command {
        Commands::Users { action } => run_user_action(&service, action).await?,
        Commands::Dashboard {
            refreshes,
            interval,
        } => dashboard(service, refreshes, interval).await?,
        Commands::About => {
            info!(
                app_name = %config.app_name,
                version = APP_VERSION,
                environment = %config.environment,
                base_url = %config.base_url,
                authenticated = config.api_token.is_some(),
                "About"
            );
        }
    }

    Ok(())
}

async fn run_user_action(service: &UserService, action: UserAction) -> Result<()> {
    match action {
        UserAction::List => {
            let users = service.list_users().await?;
            info!(total = users.len(), "User list fetched");
            for user in &users {
                log_user(user);
            }
        }
        UserAction::Get { id } => {
            let user = service.get_user(&id).await?;
            info!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserAction::Create { name, email } => {
            let user = service.create_user(&UserFormData { name, email }).await?;
            info!(id = %user.id, "User created");
            info!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserAction::Update { id, name, email } => {
            let patch = UserPatch { name, email };
            if patch.is_empty() {
                bail!("nothing to update: pass --name and/or --email");
            }
            let user = service.update_user(&id, &patch).await?;
            info!(id = %user.id, "User updated");
            info!("{}", serde_json::to_string_pretty(&user)?);
        }
        UserAction::Delete { id } => {
            service.delete_user(&id).await?;
            info!(id = %id, "User deleted");
        }
    }
    Ok(())
}

/// Loads the user list into a [`Resource`], renders the latest published state,
/// and refetches `refreshes` times, `interval` seconds apart.
#[tracing::instrument(skip(service))]
async fn dashboard(service: UserService, refreshes: usize, interval: u64) -> Result<()> {
    let resource = Resource::new(move || {
        let service = service.clone();
        async move { service.list_users().await }
    });

    let mut rx = resource.subscribe();
    let renderer = tokio::spawn(async move {
        render(&(*rx.borrow_and_update()).clone());
        // Ends once the resource and its in-flight invocations are gone.
        while rx.changed().await.is_ok() {
            let state = (*rx.borrow_and_update()).clone();
            render(&state);
        }
    });

    resource.settled().await;

    for round in 1..=refreshes {
        tokio::time::sleep(Duration::from_secs(interval)).await;
        info!(round, total = refreshes, "Refreshing data");
        let settlement = resource.refetch().await;
        info!(round, ?settlement, "Refresh finished");
    }

    drop(resource);
    if let Err(e) = renderer.await {
        warn!(error = %e, "Renderer task ended abnormally");
    }
    Ok(())
}

fn render(state: &LoadState<Vec<User>>) {
    match state {
        LoadState::Idle => {}
        LoadState::Loading => info!("Loading users"),
        LoadState::Success(users) => {
            info!(total = users.len(), "Users loaded");
            for user in users {
                log_user(user);
            }
        }
        LoadState::Failure(err) => {
            error!(error = %err.message, status = ?err.status_code, "Failed to load users")
        }
    }
}

fn log_user(user: &User) {
    info!(
        id = %user.id,
        name = %user.name,
        email = %user.email,
        updated_at = %user.updated_at,
        "User"
    );
}
