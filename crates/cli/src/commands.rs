//! CLI commands

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;
use trek_core::TrekConfig;
use trek_http::types::RegisterRequest;
use trek_http::{PublicTrekClient, TypedClientBuilder};
use trek_session::{
    GuardDecision, Navigation, Redirects, RouteTable, SessionManager, SessionSnapshot,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and print the decoded identity
    Login {
        #[arg(long, env = "TREK_USERNAME")]
        username: String,

        #[arg(long, env = "TREK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "TREK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Request a password reset link
    ForgotPassword {
        #[arg(long)]
        username: String,
    },

    /// List published blog posts
    Blogs,

    /// List published events
    Events,

    /// List active pricing packages
    Packages,

    /// Show what navigating to a path would do
    Guard {
        /// Site path, e.g. /admin/blog/new
        path: String,

        /// Access token to evaluate the path with; omitted means signed out
        #[arg(long)]
        token: Option<String>,
    },

    /// Sign in, keep the session alive and print every state change
    Watch {
        #[arg(long, env = "TREK_USERNAME")]
        username: String,

        #[arg(long, env = "TREK_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

impl Commands {
    pub async fn execute(self, config: TrekConfig) -> Result<()> {
        match self {
            Self::Login { username, password } => login(&config, username, password).await,
            Self::Register {
                username,
                email,
                password,
            } => {
                let request = RegisterRequest {
                    username,
                    email,
                    password,
                };
                let response = public_client(&config)?.register(&request).await?;
                println!("{}", response.message.as_deref().unwrap_or("Registered"));
                Ok(())
            }
            Self::ForgotPassword { username } => {
                let response = public_client(&config)?.forgot_password(username).await?;
                println!(
                    "{}",
                    response.message.as_deref().unwrap_or("Reset link sent")
                );
                Ok(())
            }
            Self::Blogs => print_json(&public_client(&config)?.list_published_blogs().await?),
            Self::Events => print_json(&public_client(&config)?.list_published_events().await?),
            Self::Packages => print_json(&public_client(&config)?.list_public_packages().await?),
            Self::Guard { path, token } => guard(&config, &path, token),
            Self::Watch { username, password } => watch_session(&config, username, password).await,
        }
    }
}

fn public_client(config: &TrekConfig) -> Result<PublicTrekClient> {
    TypedClientBuilder::from_config(&config.api)
        .build_public()
        .context("Failed to build API client")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn login(config: &TrekConfig, username: String, password: String) -> Result<()> {
    let manager = SessionManager::from_config(config)?;
    let identity = manager
        .sign_in(username, password)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
    print_json(&identity)
}

/// Decide a navigation without touching the network
fn guard(config: &TrekConfig, path: &str, token: Option<String>) -> Result<()> {
    let table = RouteTable::default_site(&Redirects::from(&config.routes));
    let snapshot = match token {
        Some(token) => {
            // Offline evaluation; the manager never calls the API here
            let manager = SessionManager::from_config(config)?;
            manager.login(token)?;
            manager.snapshot()
        }
        None => SessionSnapshot::unauthenticated(),
    };

    match table.navigate(path, &snapshot) {
        Navigation::NotFound => println!("{path}: not found"),
        Navigation::Matched {
            pattern, decision, ..
        } => {
            let outcome = match decision {
                GuardDecision::Render => "render".to_string(),
                GuardDecision::Pending => "pending".to_string(),
                GuardDecision::RedirectToLogin(to) | GuardDecision::RedirectToHome(to) => {
                    format!("redirect to {to}")
                }
            };
            println!("{path} ({pattern}): {outcome}");
        }
    }
    Ok(())
}

fn describe(snapshot: &SessionSnapshot) -> String {
    match snapshot.identity() {
        Some(identity) => format!(
            "{:?} as {} ({})",
            snapshot.status(),
            identity.subject_id,
            identity.role
        ),
        None => format!("{:?}", snapshot.status()),
    }
}

async fn watch_session(config: &TrekConfig, username: String, password: String) -> Result<()> {
    let manager = SessionManager::from_config(config)?;
    let mut states: watch::Receiver<SessionSnapshot> = manager.subscribe();

    manager
        .sign_in(username, password)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    let activation = manager.activate();
    info!(
        idle_timeout_secs = manager.policy().idle_timeout.as_secs(),
        "Watching session, press Ctrl-C to stop"
    );
    println!("{}", describe(&states.borrow_and_update()));

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = states.borrow_and_update().clone();
                println!("{}", describe(&snapshot));
                if snapshot.is_empty() && !snapshot.loading() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                manager.logout().await;
                break;
            }
        }
    }

    activation.deactivate().await;
    Ok(())
}
