//! Logging Conventions
//!
//! All crates log through `tracing` with structured fields. The subscriber
//! is installed once by the binary; libraries never install one.
//!
//! # Log Levels
//!
//! | Level | Usage | Examples |
//! |-------|-------|----------|
//! | ERROR | Request failed for good, session lost | Refresh rejected, transport down |
//! | WARN  | Recoverable issues | Retry scheduled, poll window exhausted |
//! | INFO  | Case and session state changes | Status transition, login, link issued |
//! | DEBUG | Operation flow | Request sent, step validated, poll tick |
//! | TRACE | Full payloads | Response bodies |
//!
//! # Examples
//!
//! ```ignore
//! use tracing::{info, warn};
//!
//! info!(
//!     case_id = %case.id,
//!     from = %from,
//!     to = %to,
//!     "Case status changed"
//! );
//!
//! warn!(
//!     path = %request.path,
//!     attempt,
//!     delay_ms = delay.as_millis() as u64,
//!     "Retrying request"
//! );
//! ```

use serde::{Deserialize, Serialize};

/// Log level, parsed from `VISA_LOG_LEVEL` / `--log-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Filter directive scoping the level to this workspace's crates
    pub fn directive(&self) -> String {
        format!(
            "visa_core={lvl},visa_client={lvl},visa_cli={lvl},warn",
            lvl = self.as_str()
        )
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operation names carried in the `operation` span field
pub mod operations {
    // Session
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const TOKEN_REFRESH: &str = "token_refresh";

    // Cases
    pub const CASE_CREATE: &str = "case_create";
    pub const CASE_TRANSITION: &str = "case_transition";
    pub const CASE_DELETE: &str = "case_delete";

    // Links
    pub const LINK_ISSUE: &str = "link_issue";
    pub const LINK_REVOKE: &str = "link_revoke";

    // Diagnosis
    pub const DIAGNOSIS_START: &str = "diagnosis_start";
    pub const DIAGNOSIS_POLL: &str = "diagnosis_poll";
    pub const ISSUE_UPDATE: &str = "issue_update";

    // Wizard
    pub const STEP_SAVE: &str = "step_save";
    pub const FORM_SUBMIT: &str = "form_submit";
    pub const FILE_UPLOAD: &str = "file_upload";

    // Translation
    pub const TRANSLATION_EDIT: &str = "translation_edit";
}

/// Operation and case a unit of work belongs to.
///
/// Client operations run their requests inside [`LogContext::span`], so
/// retry, refresh and transition events carry the same `operation` and
/// `case_id` fields.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub operation: &'static str,
    pub case_id: Option<String>,
}

impl LogContext {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            case_id: None,
        }
    }

    pub fn with_case_id(mut self, id: impl std::fmt::Display) -> Self {
        self.case_id = Some(id.to_string());
        self
    }

    /// Open a span carrying this context
    pub fn span(&self) -> tracing::Span {
        let span = tracing::info_span!("op", operation = self.operation, case_id = tracing::field::Empty);
        if let Some(id) = &self.case_id {
            span.record("case_id", id.as_str());
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CaseId;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_log_level_directive() {
        assert_eq!(
            LogLevel::Debug.directive(),
            "visa_core=debug,visa_client=debug,visa_cli=debug,warn"
        );
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn test_log_context_span() {
        let ctx = LogContext::new(operations::CASE_TRANSITION).with_case_id(CaseId::new("case-1"));
        assert_eq!(ctx.case_id.as_deref(), Some("case-1"));

        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = ctx.span();
            let meta = span.metadata().unwrap();
            assert_eq!(meta.name(), "op");
            assert!(meta.fields().field("operation").is_some());
            assert!(meta.fields().field("case_id").is_some());
        });
    }
}
