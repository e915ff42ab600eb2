//! Visa Core Error Codes Registry
//!
//! Error code format: VC-{module}-{sequence}
//! - VC-CASE: Case lifecycle errors
//! - VC-LINK: Client link errors
//! - VC-DIAG: Diagnosis report errors
//! - VC-FORM: Wizard form errors
//! - VC-UPLOAD: File pre-validation errors

use thiserror::Error;

use crate::lifecycle::{CaseStatus, CaseTrigger};
use crate::types::LinkStatus;
use crate::validation::ValidationErrors;

/// Visa core result type
pub type VisaResult<T> = Result<T, VisaError>;

/// Visa core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisaError {
    // ============================================================
    // Case Lifecycle Errors (VC-CASE-*)
    // ============================================================
    /// [VC-CASE-001] Trigger not legal from the current status
    #[error("[VC-CASE-001] Transition {trigger} not allowed from status {from}")]
    InvalidTransition { from: CaseStatus, trigger: CaseTrigger },

    /// [VC-CASE-002] Transition legal but its precondition does not hold
    #[error("[VC-CASE-002] Guard rejected {trigger}: {reason}")]
    GuardRejected { trigger: CaseTrigger, reason: String },

    /// [VC-CASE-003] Case already in a terminal status
    #[error("[VC-CASE-003] Case is in terminal status {status}")]
    TerminalStatus { status: CaseStatus },

    /// [VC-CASE-004] Unknown status name
    #[error("[VC-CASE-004] Unknown case status '{value}'")]
    UnknownStatus { value: String },

    /// [VC-CASE-005] Unknown trigger name
    #[error("[VC-CASE-005] Unknown case trigger '{value}'")]
    UnknownTrigger { value: String },

    // ============================================================
    // Link Errors (VC-LINK-*)
    // ============================================================
    /// [VC-LINK-001] Invalid link status transition
    #[error("[VC-LINK-001] Invalid link status transition: {from} -> {to}")]
    InvalidLinkTransition { from: LinkStatus, to: LinkStatus },

    /// [VC-LINK-002] Link is not usable
    #[error("[VC-LINK-002] Link is {status} and cannot be used")]
    LinkNotUsable { status: LinkStatus },

    // ============================================================
    // Diagnosis Errors (VC-DIAG-*)
    // ============================================================
    /// [VC-DIAG-001] A report already exists for the review round
    #[error("[VC-DIAG-001] Diagnosis report for review round {round} already exists")]
    DuplicateReportRound { round: u32 },

    /// [VC-DIAG-002] Report rounds must strictly increase
    #[error("[VC-DIAG-002] Review round {round} is older than latest round {latest}")]
    StaleReportRound { round: u32, latest: u32 },

    /// [VC-DIAG-003] Superseded reports are immutable
    #[error("[VC-DIAG-003] Report for round {round} has been superseded and is read-only")]
    ReportSuperseded { round: u32 },

    /// [VC-DIAG-004] Issue not found in report
    #[error("[VC-DIAG-004] Issue {issue_id} not found")]
    IssueNotFound { issue_id: String },

    /// [VC-DIAG-005] Risk score out of range
    #[error("[VC-DIAG-005] Risk score {score} outside 0..=100")]
    RiskScoreOutOfRange { score: u32 },

    // ============================================================
    // Form Errors (VC-FORM-*)
    // ============================================================
    /// [VC-FORM-001] Step validation failed
    #[error("[VC-FORM-001] Step {step} failed validation: {errors}")]
    StepInvalid { step: String, errors: ValidationErrors },

    /// [VC-FORM-002] Unknown wizard step slug
    #[error("[VC-FORM-002] Unknown wizard step '{slug}'")]
    UnknownStep { slug: String },

    /// [VC-FORM-003] Step payload is not a JSON object
    #[error("[VC-FORM-003] Step payload must be a JSON object")]
    PayloadNotObject,

    // ============================================================
    // Upload Errors (VC-UPLOAD-*)
    // ============================================================
    /// [VC-UPLOAD-001] File too large
    #[error("[VC-UPLOAD-001] File {file_name} is {size} bytes, limit is {limit}")]
    FileTooLarge { file_name: String, size: u64, limit: u64 },

    /// [VC-UPLOAD-002] Unsupported content type
    #[error("[VC-UPLOAD-002] File {file_name} has unsupported type {content_type}")]
    UnsupportedFileType { file_name: String, content_type: String },

    /// [VC-UPLOAD-003] Empty file
    #[error("[VC-UPLOAD-003] File {file_name} is empty")]
    EmptyFile { file_name: String },

    // ============================================================
    // General Errors
    // ============================================================
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VisaError {
    /// Registry code of this error, if any
    pub fn code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidTransition { .. } => "VC-CASE-001",
            Self::GuardRejected { .. } => "VC-CASE-002",
            Self::TerminalStatus { .. } => "VC-CASE-003",
            Self::UnknownStatus { .. } => "VC-CASE-004",
            Self::UnknownTrigger { .. } => "VC-CASE-005",
            Self::InvalidLinkTransition { .. } => "VC-LINK-001",
            Self::LinkNotUsable { .. } => "VC-LINK-002",
            Self::DuplicateReportRound { .. } => "VC-DIAG-001",
            Self::StaleReportRound { .. } => "VC-DIAG-002",
            Self::ReportSuperseded { .. } => "VC-DIAG-003",
            Self::IssueNotFound { .. } => "VC-DIAG-004",
            Self::RiskScoreOutOfRange { .. } => "VC-DIAG-005",
            Self::StepInvalid { .. } => "VC-FORM-001",
            Self::UnknownStep { .. } => "VC-FORM-002",
            Self::PayloadNotObject => "VC-FORM-003",
            Self::FileTooLarge { .. } => "VC-UPLOAD-001",
            Self::UnsupportedFileType { .. } => "VC-UPLOAD-002",
            Self::EmptyFile { .. } => "VC-UPLOAD-003",
            Self::SerializationError(_) => return None,
        };
        Some(code)
    }

    /// Whether the error was produced by a lifecycle rule
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::GuardRejected { .. } | Self::TerminalStatus { .. }
        )
    }
}

impl From<serde_json::Error> for VisaError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
