//! Visa CLI Entry Point
//!
//! Configuration is loaded from environment variables (via .env file).
//! Command-line arguments override environment variables.
//!
//! Usage:
//!   visa login        - Sign in
//!   visa case list    - List cases
//!   visa case act     - Apply a lifecycle action
//!   visa wizard save  - Validate and save a questionnaire step

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visa_cli::{handler, output, Cli};
use visa_core::logging::LogLevel;

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.verbose || cli.log_level.is_some() {
        init_logging(cli.log_level.as_deref(), cli.verbose);
    }

    if let Err(e) = handler::run(cli).await {
        output::print_error(&e);
        std::process::exit(e.exit_code());
    }
}

/// Initialize logging with tracing; RUST_LOG wins over the flags
fn init_logging(level: Option<&str>, verbose: bool) {
    let fallback = level
        .and_then(LogLevel::parse)
        .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Info });
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
