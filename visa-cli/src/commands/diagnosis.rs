//! Diagnosis and Translation Commands

use clap::Subcommand;

/// Diagnosis subcommands
#[derive(Subcommand, Debug)]
pub enum DiagnosisCommands {
    /// Show the latest report of a case
    Show {
        /// Case ID
        case_id: String,

        /// Show every review round
        #[arg(long)]
        history: bool,
    },

    /// Start an AI review
    Start {
        /// Case ID
        case_id: String,
    },

    /// Poll until the running review produces a report
    Watch {
        /// Case ID
        case_id: String,

        /// Seconds between polls
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Seconds before giving up
        #[arg(long, default_value = "600")]
        timeout: u64,
    },

    /// Attach a consultant note to an issue of the latest report
    Note {
        /// Case ID
        case_id: String,

        /// Issue ID
        issue_id: String,

        /// Note text
        note: String,
    },

    /// Mark an issue of the latest report fixed, or reopen it
    Fix {
        /// Case ID
        case_id: String,

        /// Issue ID
        issue_id: String,

        /// Reopen instead of marking fixed
        #[arg(long)]
        reopen: bool,
    },

    /// Ask the backend to apply every auto-fixable suggestion
    AutoFix {
        /// Report ID
        report_id: String,
    },

    /// Produce the final documents from a report
    Generate {
        /// Report ID
        report_id: String,
    },

    /// Send the report to the client
    SendClient {
        /// Report ID
        report_id: String,
    },
}

/// Translation subcommands
#[derive(Subcommand, Debug)]
pub enum TranslationCommands {
    /// Show the source/translation comparison of a case
    Show {
        /// Case ID
        case_id: String,

        /// Only fields flagged for review
        #[arg(long)]
        review: bool,
    },

    /// Replace the translated value of a field
    Edit {
        /// Case ID
        case_id: String,

        /// Field ID
        field_id: String,

        /// New translated value
        value: String,
    },
}
