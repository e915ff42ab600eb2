//! Visa CLI - Command Line Interface
//!
//! Command-line access to the visa case backend for consultants, plus the
//! client questionnaire for whoever holds a link token.
//!
//! # Features
//!
//! - Sign in and keep the session between invocations
//! - List, create and move cases through their lifecycle
//! - Review diagnosis reports and translations
//! - Validate questionnaire steps offline before saving them
//! - Dashboard statistics and notifications
//!
//! # Usage
//!
//! ```text
//! visa [OPTIONS] <COMMAND>
//!
//! Commands:
//!   login          Sign in as a consultant
//!   logout         Sign out and forget stored credentials
//!   whoami         Show the signed-in consultant
//!   case           Manage cases
//!   link           Manage client links
//!   diagnosis      Review AI diagnosis reports
//!   translation    Review machine translations
//!   wizard         Fill the client questionnaire
//!   stats          Dashboard statistics
//!   notifications  Inbox notifications
//!
//! Options:
//!   -a, --api-url <URL>          Backend origin [default: http://localhost:8000]
//!       --api-prefix <PREFIX>    REST prefix [default: /api/v1]
//!       --session-file <PATH>    Remembered credentials [default: .visa-session.json]
//!   -f, --format <FORMAT>        Output format (json, table, plain) [default: table]
//!   -v, --verbose                Enable verbose output
//!       --log-level <LEVEL>      error, warn, info, debug, trace
//! ```
//!
//! # Examples
//!
//! ## Move a case forward
//! ```text
//! visa login -e consultant@example.com -p ****
//! visa case act 6f1c... send_link
//! visa case act 6f1c... confirm_submission --wait
//! ```
//!
//! ## Check a step before saving it
//! ```text
//! visa wizard validate basic-info basic.json
//! visa wizard save -t <token> basic-info basic.json --draft
//! ```

pub mod commands;
pub mod error;
pub mod handler;
pub mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};

/// Visa CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
