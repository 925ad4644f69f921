//! CLI command definitions and dispatch.

pub mod account;
pub mod identity;
pub mod permissions;

use clap::{Parser, Subcommand};

use tagtag_auth::SessionController;
use tagtag_core::config::AppConfig;
use tagtag_core::error::AppError;
use tagtag_core::result::AppResult;
use tagtag_core::types::Principal;

use crate::output::OutputFormat;

/// Tagtag console session client
#[derive(Debug, Parser)]
#[command(name = "tagtag", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (replaces config/default + environment overlay)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Configuration environment overlay (config/{env}.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and keep the session token
    Login(account::LoginArgs),
    /// End the session here and on the server
    Logout,
    /// Create a new account
    Register(account::RegisterArgs),
    /// Show the logged-in user
    Whoami,
    /// Show session and token status
    Status,
    /// Refresh the access token now
    Refresh,
    /// List or check access codes
    Codes(permissions::CodesArgs),
    /// Show the menu tree or route table
    Menus(permissions::MenusArgs),
}

impl Cli {
    /// Load configuration for this invocation
    pub fn load_config(&self) -> AppResult<AppConfig> {
        match &self.config {
            Some(path) => AppConfig::load_file(path),
            None => AppConfig::load(&self.env),
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        let session = SessionController::from_config(&config)?;

        let result = match &self.command {
            Commands::Login(args) => account::login(&session, args, self.format).await,
            Commands::Logout => account::logout(&session).await,
            Commands::Register(args) => account::register(&session, args).await,
            Commands::Whoami => identity::whoami(&session, self.format).await,
            Commands::Status => identity::status(&session, self.format).await,
            Commands::Refresh => identity::refresh(&session).await,
            Commands::Codes(args) => permissions::codes(&session, args, self.format).await,
            Commands::Menus(args) => permissions::menus(&session, args, self.format).await,
        };

        session.teardown().await;
        result
    }
}

/// Helper: restore the persisted session or fail with `Unauthenticated`
pub async fn require_session(session: &SessionController) -> AppResult<Principal> {
    session
        .init()
        .await?
        .ok_or_else(|| AppError::unauthenticated("Not logged in; run `tagtag login` first"))
}
