//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tollgate::OperationClass;

/// Tollgate - throttled, self-refreshing API client
#[derive(Parser, Debug)]
#[command(name = "tollgate")]
#[command(about = "Throttled, self-refreshing API client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file only
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the client-side limit for every operation class
    Limits,

    /// Send one request through the gateway
    Request(RequestArgs),
}

/// Arguments for `tollgate request`
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Path relative to the configured base URL
    pub path: String,

    /// Operation class the request counts against
    #[arg(long, default_value = "api")]
    pub class: OperationClass,

    /// JSON request body
    #[arg(long)]
    pub json: Option<String>,

    /// Bearer token
    #[arg(long, env = "TOLLGATE_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Refresh token for the `[auth]` identity provider
    #[arg(
        long,
        env = "TOLLGATE_REFRESH_TOKEN",
        hide_env_values = true,
        conflicts_with = "token"
    )]
    pub refresh_token: Option<String>,

    /// Send without credentials
    #[arg(long)]
    pub skip_auth: bool,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}
