//! Dashboard Commands
//!
//! Statistics and inbox notifications.

use clap::Subcommand;

/// Statistics subcommands
#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Headline counters
    Overview,

    /// Cases created and completed per day
    Trend {
        /// Days to look back
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Cases per status
    Status,

    /// Cases per visa type
    VisaTypes,
}

/// Notification subcommands
#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List notifications
    List {
        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(short = 's', long, default_value = "20")]
        per_page: u32,

        /// Only unread notifications
        #[arg(short, long)]
        unread: bool,
    },

    /// Mark one notification read, or all with `--all`
    Read {
        /// Notification ID
        #[arg(required_unless_present = "all")]
        id: Option<String>,

        /// Mark every notification read
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },

    /// Show the unread counter
    Unread,
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    use super::*;

    #[test]
    fn test_trend_days() {
        let cli = Cli::try_parse_from(["visa", "stats", "trend", "--days", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats(StatsCommands::Trend { days: 7 })));
        let cli = Cli::try_parse_from(["visa", "stats", "visa-types"]).unwrap();
        assert!(matches!(cli.command, Commands::Stats(StatsCommands::VisaTypes)));
    }

    #[test]
    fn test_read_needs_id_or_all() {
        assert!(Cli::try_parse_from(["visa", "notifications", "read"]).is_err());
        assert!(Cli::try_parse_from(["visa", "notifications", "read", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["visa", "notifications", "read", "n1", "--all"]).is_err());
    }
}
