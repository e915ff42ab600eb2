//! Wizard Commands
//!
//! Client questionnaire steps. Everything except `steps` and `validate`
//! talks to the backend with the link token, not consultant credentials.

use clap::Subcommand;
use std::path::PathBuf;

/// Wizard subcommands
#[derive(Subcommand, Debug)]
pub enum WizardCommands {
    /// List the questionnaire steps in order
    Steps,

    /// Validate a step payload locally without sending it
    Validate {
        /// Step slug, e.g. `basic-info`
        step: String,

        /// JSON file with the step data
        file: PathBuf,

        /// Draft rules: type checks only
        #[arg(long)]
        draft: bool,
    },

    /// Show the saved data of a step
    Show {
        /// Link token (env: VISA_CLIENT_TOKEN)
        #[arg(short, long, env = "VISA_CLIENT_TOKEN")]
        token: String,

        /// Step slug
        step: String,
    },

    /// Validate and save a step
    Save {
        /// Link token (env: VISA_CLIENT_TOKEN)
        #[arg(short, long, env = "VISA_CLIENT_TOKEN")]
        token: String,

        /// Step slug
        step: String,

        /// JSON file with the step data
        file: PathBuf,

        /// Save as draft
        #[arg(long)]
        draft: bool,
    },

    /// Upload a document
    Upload {
        /// Link token (env: VISA_CLIENT_TOKEN)
        #[arg(short, long, env = "VISA_CLIENT_TOKEN")]
        token: String,

        /// Document kind: photo, passport_scan, supporting_document
        kind: String,

        /// File to upload
        file: PathBuf,
    },

    /// Show completed steps and where to resume
    Progress {
        /// Link token (env: VISA_CLIENT_TOKEN)
        #[arg(short, long, env = "VISA_CLIENT_TOKEN")]
        token: String,
    },

    /// Submit the completed questionnaire
    Submit {
        /// Link token (env: VISA_CLIENT_TOKEN)
        #[arg(short, long, env = "VISA_CLIENT_TOKEN")]
        token: String,
    },
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    use super::*;

    #[test]
    fn test_validate_is_offline() {
        let cli = Cli::try_parse_from(["visa", "wizard", "validate", "basic-info", "step.json", "--draft"]).unwrap();
        match cli.command {
            Commands::Wizard(WizardCommands::Validate { step, file, draft }) => {
                assert_eq!(step, "basic-info");
                assert_eq!(file, PathBuf::from("step.json"));
                assert!(draft);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_save_requires_token() {
        std::env::remove_var("VISA_CLIENT_TOKEN");
        assert!(Cli::try_parse_from(["visa", "wizard", "save", "basic-info", "step.json"]).is_err());
        assert!(Cli::try_parse_from(["visa", "wizard", "save", "-t", "t1", "basic-info", "step.json"]).is_ok());
    }
}
