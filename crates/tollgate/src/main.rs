//! Tollgate CLI binary.
//!
//! This binary provides command-line access to Tollgate:
//! - Show the configured client-side limits
//! - Send one throttled, authenticated request and print the outcome

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_request, show_limits};

    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug"
    } else {
        "warn,tollgate=info"
    };
    tollgate::observability::init_tracing_with_default(default_filter, cli.json_logs)?;

    let config = match &cli.config {
        Some(path) => tollgate::TollgateConfig::from_file(path)?,
        None => tollgate::TollgateConfig::load()?,
    };

    match cli.command {
        Commands::Limits => show_limits(&config)?,
        Commands::Request(args) => run_request(&config, args).await?,
    }

    Ok(())
}
