//! Case Commands
//!
//! Case CRUD, lifecycle actions and client links.

use clap::Subcommand;

/// Case subcommands
#[derive(Subcommand, Debug)]
pub enum CaseCommands {
    /// List cases
    List {
        /// Page number (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(short = 's', long, default_value = "20")]
        per_page: u32,

        /// Filter by status, e.g. `client_filling`
        #[arg(long)]
        status: Option<String>,

        /// Search case number or applicant name
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Sort ascending
        #[arg(long)]
        asc: bool,
    },

    /// Show case details with its available actions
    Show {
        /// Case ID
        id: String,
    },

    /// Create a case
    Create {
        /// Visa type, e.g. B1_B2
        #[arg(short = 't', long)]
        visa_type: String,

        /// Applicant name
        #[arg(short, long)]
        name: String,

        /// Applicant name in pinyin
        #[arg(long)]
        pinyin: Option<String>,

        /// Applicant email
        #[arg(long)]
        email: Option<String>,

        /// Applicant phone
        #[arg(long)]
        phone: Option<String>,

        /// Passport number
        #[arg(long)]
        passport: Option<String>,

        /// Internal notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a case
    Delete {
        /// Case ID
        id: String,
    },

    /// Show the activity timeline of a case
    Timeline {
        /// Case ID
        id: String,
    },

    /// Apply a lifecycle action, e.g. `send_link` or `approve_materials`
    Act {
        /// Case ID
        id: String,

        /// Action name
        trigger: String,

        /// Wait for a started AI job to finish
        #[arg(short, long)]
        wait: bool,
    },

    /// List lifecycle statuses with their labels and actions
    Statuses,
}

/// Link subcommands
#[derive(Subcommand, Debug)]
pub enum LinkCommands {
    /// Show the current link of a case
    Show {
        /// Case ID
        case_id: String,
    },

    /// Issue a new client link, revoking the previous one
    Generate {
        /// Case ID
        case_id: String,

        /// Validity in days
        #[arg(short, long, default_value = "7")]
        days: u32,
    },

    /// Revoke a link
    Revoke {
        /// Link token
        token: String,
    },
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    use super::*;

    #[test]
    fn test_case_list_defaults() {
        let cli = Cli::try_parse_from(["visa", "case", "list"]).unwrap();
        match cli.command {
            Commands::Case(CaseCommands::List {
                page,
                per_page,
                status,
                asc,
                ..
            }) => {
                assert_eq!(page, 1);
                assert_eq!(per_page, 20);
                assert!(status.is_none());
                assert!(!asc);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_case_act() {
        let cli = Cli::try_parse_from(["visa", "case", "act", "c1", "confirm_submission", "--wait"]).unwrap();
        match cli.command {
            Commands::Case(CaseCommands::Act { id, trigger, wait }) => {
                assert_eq!(id, "c1");
                assert_eq!(trigger, "confirm_submission");
                assert!(wait);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_link_generate_days() {
        let cli = Cli::try_parse_from(["visa", "link", "generate", "c1", "-d", "14"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Link(LinkCommands::Generate { days: 14, .. })
        ));
    }
}
