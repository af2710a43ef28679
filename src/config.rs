use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use std::path::PathBuf;

use crate::auth::{DEFAULT_ACTIVITY_WINDOW_SECS, DEFAULT_AUTH_API_URL};
use crate::users::DEFAULT_GRAPHQL_URL;

/// Auth client - command line front-end for the auth and user APIs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the REST auth API
    #[arg(short = 'a', long, env = "AUTH_API_URL", default_value = DEFAULT_AUTH_API_URL)]
    pub api_url: String,

    /// GraphQL endpoint URL
    #[arg(short = 'g', long, env = "GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    pub graphql_url: String,

    /// Path to the SQLite token database
    #[arg(short = 'd', long, env = "AUTH_DB_FILE")]
    pub db_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Seconds between keepalive session checks
    #[arg(long, env = "SESSION_REFRESH_INTERVAL", default_value = "60")]
    pub refresh_interval: u64,

    /// Seconds of inactivity after which keepalive stops refreshing
    #[arg(long, env = "ACTIVITY_WINDOW", default_value_t = DEFAULT_ACTIVITY_WINDOW_SECS as u64)]
    pub activity_window: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
        /// Use the GraphQL login mutation instead of the REST endpoint
        #[arg(long)]
        graphql: bool,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Clear stored tokens
    Logout,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Show the REST profile of the signed-in user
    Profile,
    /// Show the current user via GraphQL
    Me,
    /// Update the signed-in user's details via GraphQL
    UpdateUser {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Validate the stored session
    Status,
    /// Keep the session fresh while input keeps arriving on stdin
    Keepalive,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Endpoints
    pub auth_api_url: String,
    pub graphql_url: String,

    // Token storage
    pub db_file: PathBuf,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    // Keepalive
    pub session_refresh_interval: u64,
    pub activity_window: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<(Self, Command)> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let command = args.command.clone();
        Ok((Self::from_args(args)?, command))
    }

    pub fn from_args(args: CliArgs) -> Result<Self> {
        let db_file = match args.db_file {
            Some(path) => expand_tilde(&path),
            None => default_db_path().context(
                "Could not determine a data directory (use -d or set AUTH_DB_FILE)",
            )?,
        };

        Ok(Config {
            auth_api_url: args.api_url.trim_end_matches('/').to_string(),
            graphql_url: args.graphql_url,

            db_file,

            // Not worth a flag
            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.http_timeout,

            session_refresh_interval: args.refresh_interval,
            activity_window: args.activity_window,

            log_level: args.log_level,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("AUTH_API_URL", &self.auth_api_url),
            ("GRAPHQL_URL", &self.graphql_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got: {}", name, url);
            }
        }

        if self.session_refresh_interval == 0 {
            anyhow::bail!("SESSION_REFRESH_INTERVAL must be greater than zero");
        }
        if self.activity_window == 0 {
            anyhow::bail!("ACTIVITY_WINDOW must be greater than zero");
        }

        Ok(())
    }
}

/// Expand tilde (~) in file paths to user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// `<data dir>/auth-client/tokens.sqlite3`
fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("auth-client").join("tokens.sqlite3"))
}

// === Interactive Prompts ===

/// Use the given value or ask for it on the terminal
pub fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email"),
    }
}

/// Use the given value or ask for it without echo
pub fn prompt_password(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    let password = prompt.interact().context("Failed to read password")?;

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}
