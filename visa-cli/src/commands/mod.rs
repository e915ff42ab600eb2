//! CLI Commands Module
//!
//! Command definitions for the visa CLI.

pub mod case;
pub mod dashboard;
pub mod diagnosis;
pub mod wizard;

use clap::{Parser, Subcommand};

/// Visa case management CLI
#[derive(Parser, Debug)]
#[command(name = "visa")]
#[command(author = "Visa Desk Team")]
#[command(version)]
#[command(about = "Visa case management command line interface")]
#[command(long_about = "A command-line tool for consultants working with the visa case backend.\n\n\
    Use this tool to sign in, move cases through their lifecycle, review \
    AI diagnosis reports and fill the client questionnaire.")]
pub struct Cli {
    /// Backend origin (env: VISA_API_URL)
    #[arg(short, long, env = "VISA_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// REST prefix below the origin (env: VISA_API_PREFIX)
    #[arg(long, env = "VISA_API_PREFIX", default_value = "/api/v1")]
    pub api_prefix: String,

    /// Where remembered credentials are kept (env: VISA_SESSION_FILE)
    #[arg(long, env = "VISA_SESSION_FILE", default_value = ".visa-session.json")]
    pub session_file: String,

    /// Output format (json, table, plain)
    #[arg(short, long, env = "VISA_OUTPUT_FORMAT", default_value = "table")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level: error, warn, info, debug, trace (env: VISA_LOG_LEVEL)
    #[arg(long, env = "VISA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table format (human-readable)
    #[default]
    Table,
    /// Plain text
    Plain,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in as a consultant
    Login {
        /// Account email (env: VISA_EMAIL)
        #[arg(short, long, env = "VISA_EMAIL")]
        email: String,

        /// Account password (env: VISA_PASSWORD)
        #[arg(short, long, env = "VISA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Keep the session for later invocations
        #[arg(short, long)]
        remember_me: bool,
    },

    /// Sign out and forget stored credentials
    Logout,

    /// Show the signed-in consultant
    Whoami,

    /// Manage cases
    #[command(subcommand)]
    Case(case::CaseCommands),

    /// Manage client links
    #[command(subcommand)]
    Link(case::LinkCommands),

    /// Review AI diagnosis reports
    #[command(subcommand)]
    Diagnosis(diagnosis::DiagnosisCommands),

    /// Review machine translations
    #[command(subcommand)]
    Translation(diagnosis::TranslationCommands),

    /// Fill the client questionnaire
    #[command(subcommand)]
    Wizard(wizard::WizardCommands),

    /// Dashboard statistics
    #[command(subcommand)]
    Stats(dashboard::StatsCommands),

    /// Inbox notifications
    #[command(subcommand)]
    Notifications(dashboard::NotificationCommands),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_help() {
        let result = Cli::try_parse_from(["visa", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "visa",
            "--api-url",
            "https://visa.example",
            "-f",
            "json",
            "--log-level",
            "debug",
            "whoami",
        ])
        .unwrap();
        assert_eq!(cli.api_url, "https://visa.example");
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn test_login_args() {
        let cli = Cli::try_parse_from([
            "visa", "login", "-e", "a@b.com", "-p", "secret", "--remember-me",
        ])
        .unwrap();
        match cli.command {
            Commands::Login {
                email,
                password,
                remember_me,
            } => {
                assert_eq!(email, "a@b.com");
                assert_eq!(password, "secret");
                assert!(remember_me);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
