//! Diagnosis Report Types
//!
//! One AI-generated, consultant-annotated report per review round.
//! History is append-only: a new round produces a new report and the
//! previous one becomes read-only.

use serde::{Deserialize, Serialize};

use super::common::*;
use crate::error::{VisaError, VisaResult};

/// Issue severity lattice: `Info < Warning < Critical < Blocker`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Blocker,
}

impl Severity {
    /// All levels, most severe first
    pub const DESCENDING: [Severity; 4] = [Self::Blocker, Self::Critical, Self::Warning, Self::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Blocker => "blocker",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "提示",
            Self::Warning => "警告",
            Self::Critical => "严重",
            Self::Blocker => "阻断",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One finding within a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisIssue {
    pub id: IssueId,
    pub field_name: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub auto_fixable: bool,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub consultant_note: Option<String>,
}

/// Issue counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub blocker: u32,
    pub critical: u32,
    pub warning: u32,
    pub info: u32,
}

impl IssueCounts {
    /// Count all issues by severity
    pub fn from_issues(issues: &[DiagnosisIssue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Blocker => counts.blocker += 1,
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.blocker + self.critical + self.warning + self.info
    }

    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Blocker => self.blocker,
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// Review snapshot for one review round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub id: ReportId,
    pub case_id: CaseId,
    pub review_round: u32,
    /// 0-100, higher is riskier
    pub risk_score: u32,
    #[serde(default)]
    pub counts: IssueCounts,
    #[serde(default)]
    pub consultant_notes: Option<String>,
    #[serde(default)]
    pub issues: Vec<DiagnosisIssue>,
    pub created_at: Timestamp,
}

impl DiagnosisReport {
    /// Validate the score range and recompute counts from the issue list
    pub fn normalized(mut self) -> VisaResult<Self> {
        if self.risk_score > 100 {
            return Err(VisaError::RiskScoreOutOfRange {
                score: self.risk_score,
            });
        }
        self.counts = IssueCounts::from_issues(&self.issues);
        Ok(self)
    }

    /// Blocker issues not yet marked fixed
    pub fn unfixed_blockers(&self) -> impl Iterator<Item = &DiagnosisIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Blocker && !i.fixed)
    }

    pub fn has_unfixed_blockers(&self) -> bool {
        self.unfixed_blockers().next().is_some()
    }

    /// Highest severity among issues still open
    pub fn highest_open_severity(&self) -> Option<Severity> {
        self.issues.iter().filter(|i| !i.fixed).map(|i| i.severity).max()
    }

    /// Issues ordered most severe first, stable within a level
    pub fn issues_by_priority(&self) -> Vec<&DiagnosisIssue> {
        let mut issues: Vec<&DiagnosisIssue> = self.issues.iter().collect();
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        issues
    }

    pub fn issue_mut(&mut self, issue_id: &IssueId) -> VisaResult<&mut DiagnosisIssue> {
        self.issues
            .iter_mut()
            .find(|i| &i.id == issue_id)
            .ok_or_else(|| VisaError::IssueNotFound {
                issue_id: issue_id.to_string(),
            })
    }
}

/// Asynchronous AI job status, as reported by the status endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Status endpoint payload for diagnosis / translation jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub status: JobState,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Consultant note update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueNoteUpdate {
    pub consultant_note: String,
}

/// Fixed flag update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatusUpdate {
    pub fixed: bool,
}

/// Result of an auto-fix run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFixResult {
    #[serde(default)]
    pub fixed_issue_ids: Vec<IssueId>,
    #[serde(default)]
    pub skipped_issue_ids: Vec<IssueId>,
}

/// Append-only per-case report history
#[derive(Debug, Clone, Default)]
pub struct ReportHistory {
    reports: Vec<DiagnosisReport>,
}

impl ReportHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the report of a new review round
    pub fn append(&mut self, report: DiagnosisReport) -> VisaResult<()> {
        if let Some(latest) = self.latest() {
            if report.review_round == latest.review_round {
                return Err(VisaError::DuplicateReportRound {
                    round: report.review_round,
                });
            }
            if report.review_round < latest.review_round {
                return Err(VisaError::StaleReportRound {
                    round: report.review_round,
                    latest: latest.review_round,
                });
            }
        }
        self.reports.push(report.normalized()?);
        Ok(())
    }

    pub fn latest(&self) -> Option<&DiagnosisReport> {
        self.reports.last()
    }

    pub fn for_round(&self, round: u32) -> Option<&DiagnosisReport> {
        self.reports.iter().find(|r| r.review_round == round)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosisReport> {
        self.reports.iter()
    }

    /// Round of the latest report when it owns the issue.
    ///
    /// An issue that only appears in an earlier round is superseded; one that
    /// appears nowhere is not found.
    pub fn editable_round(&self, issue_id: &IssueId) -> VisaResult<u32> {
        let owner = self
            .reports
            .iter()
            .rev()
            .find(|r| r.issues.iter().any(|i| &i.id == issue_id))
            .ok_or_else(|| VisaError::IssueNotFound {
                issue_id: issue_id.to_string(),
            })?;
        match self.latest() {
            Some(latest) if latest.review_round == owner.review_round => Ok(owner.review_round),
            _ => Err(VisaError::ReportSuperseded {
                round: owner.review_round,
            }),
        }
    }

    fn editable_issue(&mut self, round: u32, issue_id: &IssueId) -> VisaResult<&mut DiagnosisIssue> {
        let latest_round = self.latest().map(|r| r.review_round);
        if latest_round != Some(round) {
            return Err(VisaError::ReportSuperseded { round });
        }
        match self.reports.last_mut() {
            Some(report) => report.issue_mut(issue_id),
            None => Err(VisaError::ReportSuperseded { round }),
        }
    }

    /// Set a consultant note on an issue of the latest report
    pub fn annotate(&mut self, round: u32, issue_id: &IssueId, note: impl Into<String>) -> VisaResult<()> {
        self.editable_issue(round, issue_id)?.consultant_note = Some(note.into());
        Ok(())
    }

    /// Set the fixed flag of an issue of the latest report
    pub fn set_fixed(&mut self, round: u32, issue_id: &IssueId, fixed: bool) -> VisaResult<()> {
        self.editable_issue(round, issue_id)?.fixed = fixed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issue(id: &str, severity: Severity) -> DiagnosisIssue {
        DiagnosisIssue {
            id: IssueId::new(id),
            field_name: "passport_number".to_string(),
            severity,
            description: "mismatch".to_string(),
            suggestion: String::new(),
            auto_fixable: false,
            fixed: false,
            consultant_note: None,
        }
    }

    fn report(round: u32, issues: Vec<DiagnosisIssue>) -> DiagnosisReport {
        DiagnosisReport {
            id: ReportId::new(format!("r{}", round)),
            case_id: CaseId::new("c1"),
            review_round: round,
            risk_score: 40,
            counts: IssueCounts::default(),
            consultant_notes: None,
            issues,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_severity_lattice() {
        assert!(Severity::Blocker > Severity::Critical);
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::DESCENDING[0], Severity::Blocker);
    }

    #[test]
    fn test_counts_and_priority() {
        let r = report(
            1,
            vec![
                issue("a", Severity::Info),
                issue("b", Severity::Blocker),
                issue("c", Severity::Warning),
                issue("d", Severity::Blocker),
            ],
        )
        .normalized()
        .unwrap();
        assert_eq!(r.counts.blocker, 2);
        assert_eq!(r.counts.total(), 4);
        assert_eq!(r.issues_by_priority()[0].severity, Severity::Blocker);
        assert_eq!(r.highest_open_severity(), Some(Severity::Blocker));
        assert_eq!(r.unfixed_blockers().count(), 2);
    }

    #[test]
    fn test_risk_score_range() {
        let mut r = report(1, vec![]);
        r.risk_score = 101;
        assert!(matches!(r.normalized(), Err(VisaError::RiskScoreOutOfRange { score: 101 })));
    }

    #[test]
    fn test_history_is_append_only() {
        let mut history = ReportHistory::new();
        history.append(report(1, vec![issue("a", Severity::Blocker)])).unwrap();
        assert!(matches!(
            history.append(report(1, vec![])),
            Err(VisaError::DuplicateReportRound { round: 1 })
        ));
        history.append(report(2, vec![issue("b", Severity::Info)])).unwrap();
        assert!(matches!(
            history.append(report(1, vec![])),
            Err(VisaError::StaleReportRound { round: 1, latest: 2 })
        ));

        // Round 1 is superseded: edits are rejected and the report is untouched
        assert!(matches!(
            history.set_fixed(1, &IssueId::new("a"), true),
            Err(VisaError::ReportSuperseded { round: 1 })
        ));
        assert!(!history.for_round(1).unwrap().issues[0].fixed);

        history.annotate(2, &IssueId::new("b"), "checked with client").unwrap();
        history.set_fixed(2, &IssueId::new("b"), true).unwrap();
        let latest = history.latest().unwrap();
        assert!(latest.issues[0].fixed);
        assert_eq!(latest.issues[0].consultant_note.as_deref(), Some("checked with client"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_editable_round_follows_latest_report() {
        let mut history = ReportHistory::new();
        assert!(matches!(
            history.editable_round(&IssueId::new("a")),
            Err(VisaError::IssueNotFound { .. })
        ));

        history.append(report(1, vec![issue("a", Severity::Blocker)])).unwrap();
        assert_eq!(history.editable_round(&IssueId::new("a")).unwrap(), 1);

        history.append(report(2, vec![issue("b", Severity::Warning)])).unwrap();
        assert_eq!(history.editable_round(&IssueId::new("b")).unwrap(), 2);
        assert!(matches!(
            history.editable_round(&IssueId::new("a")),
            Err(VisaError::ReportSuperseded { round: 1 })
        ));
        assert!(matches!(
            history.editable_round(&IssueId::new("zz")),
            Err(VisaError::IssueNotFound { ref issue_id }) if issue_id == "zz"
        ));
    }
}
