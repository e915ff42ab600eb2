//! AI diagnosis reports

use tracing::{debug, info, Instrument};
use visa_core::logging::{operations, LogContext};
use visa_core::{
    AutoFixResult, CaseId, DiagnosisIssue, DiagnosisReport, IssueId, IssueNoteUpdate, IssueStatusUpdate, JobState,
    JobStatus, ReportHistory, ReportId,
};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::polling::{poll_until_complete, PollConfig};
use crate::transport::ApiRequest;

pub struct DiagnosisApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DiagnosisApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Latest report; `None` before the first review completes
    pub async fn latest(&self, case_id: &CaseId) -> ClientResult<Option<DiagnosisReport>> {
        let report: Option<DiagnosisReport> = match self
            .client
            .call(ApiRequest::get(format!("/cases/{}/diagnosis/latest", case_id)))
            .await
        {
            Err(ClientError::NotFound { .. }) => None,
            other => other?,
        };
        report.map(|r| r.normalized().map_err(ClientError::from)).transpose()
    }

    /// Every report of the case, oldest round first
    pub async fn history(&self, case_id: &CaseId) -> ClientResult<ReportHistory> {
        let mut reports: Vec<DiagnosisReport> = self
            .client
            .call(ApiRequest::get(format!("/cases/{}/diagnosis/history", case_id)))
            .await?
            .unwrap_or_default();
        reports.sort_by_key(|r| r.review_round);
        let mut history = ReportHistory::new();
        for report in reports {
            history.append(report)?;
        }
        Ok(history)
    }

    /// Start the AI review of the submitted materials
    pub async fn start(&self, case_id: &CaseId) -> ClientResult<JobStatus> {
        let status = self
            .client
            .call(ApiRequest::post(format!("/cases/{}/diagnosis", case_id)))
            .instrument(LogContext::new(operations::DIAGNOSIS_START).with_case_id(case_id).span())
            .await?
            .unwrap_or(JobStatus {
                status: JobState::Pending,
                progress: None,
                message: None,
            });
        info!(case_id = %case_id, "Diagnosis started");
        Ok(status)
    }

    pub async fn status(&self, case_id: &CaseId) -> ClientResult<JobStatus> {
        self.client
            .fetch(ApiRequest::get(format!("/cases/{}/diagnosis/status", case_id)))
            .await
    }

    /// Poll the job until it finishes, then fetch the resulting report
    pub async fn wait_for_report(&self, case_id: &CaseId, config: &PollConfig) -> ClientResult<DiagnosisReport> {
        let finished = poll_until_complete(config, || async {
            let status = self.status(case_id).await?;
            Ok(status.status.is_finished().then_some(status))
        })
        .instrument(LogContext::new(operations::DIAGNOSIS_POLL).with_case_id(case_id).span())
        .await?;

        if finished.status == JobState::Failed {
            return Err(ClientError::JobFailed {
                message: finished.message.unwrap_or_else(|| "diagnosis failed".to_string()),
            });
        }
        self.latest(case_id)
            .await?
            .ok_or_else(|| ClientError::decode("diagnosis completed without a report"))
    }

    /// Set the consultant note of an issue in the latest report.
    ///
    /// Issues of superseded rounds are rejected before anything is sent.
    pub async fn update_note(
        &self,
        history: &mut ReportHistory,
        issue_id: &IssueId,
        note: &str,
    ) -> ClientResult<DiagnosisIssue> {
        let round = history.editable_round(issue_id)?;
        let issue: DiagnosisIssue = self
            .client
            .fetch(
                ApiRequest::patch(format!("/diagnosis/issues/{}/note", issue_id)).json(&IssueNoteUpdate {
                    consultant_note: note.to_string(),
                })?,
            )
            .instrument(LogContext::new(operations::ISSUE_UPDATE).span())
            .await?;
        history.annotate(round, issue_id, note)?;
        Ok(issue)
    }

    /// Mark an issue of the latest report fixed or open again
    pub async fn set_fixed(
        &self,
        history: &mut ReportHistory,
        issue_id: &IssueId,
        fixed: bool,
    ) -> ClientResult<DiagnosisIssue> {
        let round = history.editable_round(issue_id)?;
        let issue: DiagnosisIssue = self
            .client
            .fetch(ApiRequest::patch(format!("/diagnosis/issues/{}/status", issue_id)).json(&IssueStatusUpdate { fixed })?)
            .instrument(LogContext::new(operations::ISSUE_UPDATE).span())
            .await?;
        history.set_fixed(round, issue_id, fixed)?;
        debug!(issue_id = %issue_id, round, fixed, "Issue status updated");
        Ok(issue)
    }

    /// Start AI processing of the approved materials
    pub async fn generate(&self, report_id: &ReportId) -> ClientResult<()> {
        self.client
            .send(ApiRequest::post(format!("/diagnosis/reports/{}/generate", report_id)))
            .await
    }

    pub async fn send_to_client(&self, report_id: &ReportId) -> ClientResult<()> {
        self.client
            .send(ApiRequest::post(format!("/diagnosis/reports/{}/send-client", report_id)))
            .await
    }

    pub async fn auto_fix(&self, report_id: &ReportId) -> ClientResult<AutoFixResult> {
        self.client
            .fetch(ApiRequest::post(format!("/diagnosis/reports/{}/auto-fix", report_id)))
            .await
    }
}
