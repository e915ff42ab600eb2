//! Case detail view state
//!
//! Holds what a case page displays: the case as last confirmed by the
//! backend, its latest report, and a toast queue. Failures never move the
//! displayed status; only a successful re-fetch does.

use std::sync::{Arc, Mutex};
use tracing::debug;
use visa_core::{status_meta, Case, CaseId, CaseStatus, CaseTrigger, DiagnosisReport, GuardContext};

use crate::error::{ClientError, ClientResult};
use crate::polling::{PollConfig, PollHandle};
use crate::workflow::CaseWorkflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient user notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Toast queue shared between a view and its background tasks
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Toast {
                level,
                message: message.into(),
            });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn error(&self, error: &ClientError) {
        self.push(ToastLevel::Error, error.user_message());
    }

    /// Take every queued toast
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }
}

pub struct CaseView {
    workflow: CaseWorkflow,
    case_id: CaseId,
    case: Option<Case>,
    report: Option<DiagnosisReport>,
    loading: bool,
    notifier: Notifier,
    watch: Option<PollHandle<Case>>,
}

impl CaseView {
    pub fn new(workflow: CaseWorkflow, case_id: CaseId) -> Self {
        Self {
            workflow,
            case_id,
            case: None,
            report: None,
            loading: false,
            notifier: Notifier::new(),
            watch: None,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn case(&self) -> Option<&Case> {
        self.case.as_ref()
    }

    pub fn report(&self) -> Option<&DiagnosisReport> {
        self.report.as_ref()
    }

    /// Status currently shown
    pub fn status(&self) -> Option<CaseStatus> {
        self.case.as_ref().map(|c| c.status)
    }

    pub fn status_label(&self) -> Option<&'static str> {
        self.status().map(|s| status_meta(s).label)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the control for `trigger` should be disabled
    pub fn is_busy(&self, trigger: CaseTrigger) -> bool {
        self.workflow.is_in_flight(&self.case_id, trigger)
    }

    /// Load case and latest report; failures become a toast
    pub async fn load(&mut self) -> bool {
        self.loading = true;
        let result = self.fetch().await;
        self.loading = false;
        match result {
            Ok(()) => true,
            Err(e) => {
                self.notifier.error(&e);
                false
            }
        }
    }

    async fn fetch(&mut self) -> ClientResult<()> {
        let client = self.workflow.client();
        let case = client.cases().get(&self.case_id).await?;
        let report = client.diagnosis().latest(&self.case_id).await?;
        self.case = Some(case);
        self.report = report;
        Ok(())
    }

    /// Consultant actions offered for the displayed status whose guard holds
    pub fn available_actions(&self) -> Vec<CaseTrigger> {
        let Some(case) = &self.case else {
            return Vec::new();
        };
        let ctx = GuardContext {
            latest_report: self.report.as_ref(),
        };
        status_meta(case.status)
            .allowed_actions
            .iter()
            .copied()
            .filter(|t| case.can_apply(*t, &ctx))
            .collect()
    }

    /// Run `trigger`; returns whether the backend confirmed the new status
    pub async fn act(&mut self, trigger: CaseTrigger) -> bool {
        let attempt = match self.workflow.perform(&self.case_id, trigger).await {
            Ok(attempt) => attempt,
            Err(e) => {
                self.notifier.error(&e);
                return false;
            }
        };

        let applied = attempt.applied();
        if let Some(case) = attempt.case {
            self.case = Some(case);
        }
        match attempt.outcome {
            Ok(()) if applied => self.notifier.success(format!("{}成功", trigger.label())),
            Ok(()) => self.notifier.push(ToastLevel::Info, "操作已提交，状态尚未更新"),
            Err(e) => self.notifier.error(&e),
        }

        if let Ok(report) = self.workflow.client().diagnosis().latest(&self.case_id).await {
            self.report = report;
        }
        applied
    }

    /// Start watching a running AI job in the background
    pub fn watch_ai(&mut self, config: PollConfig) {
        let workflow = self.workflow.clone();
        let case_id = self.case_id.clone();
        let handle = PollHandle::spawn(config.clone(), move || {
            let workflow = workflow.clone();
            let case_id = case_id.clone();
            async move {
                let case = workflow.client().cases().get(&case_id).await?;
                Ok((!case.status.is_ai_pending()).then_some(case))
            }
        });
        debug!(case_id = %self.case_id, "Watching AI job");
        self.watch = Some(handle);
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Stop the background watch
    pub fn stop_watching(&mut self) {
        if let Some(mut handle) = self.watch.take() {
            handle.cancel();
        }
    }

    /// Wait for the watch to resolve and show its result
    pub async fn settle_watch(&mut self) -> bool {
        let Some(handle) = self.watch.take() else {
            return false;
        };
        match handle.join().await {
            Ok(case) => {
                self.case = Some(case);
                if let Ok(report) = self.workflow.client().diagnosis().latest(&self.case_id).await {
                    self.report = report;
                }
                true
            }
            Err(ClientError::Cancelled) => false,
            Err(e) => {
                self.notifier.error(&e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::session::SessionContext;
    use crate::transport::HttpMethod;
    use crate::ApiClient;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn case_json(status: &str) -> Value {
        json!({
            "id": "c1", "case_number": "VC-2025-000001",
            "organization_id": "o1", "consultant_id": "u1",
            "visa_type": "B1_B2", "status": status, "review_round": 1,
            "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    fn view(mock: &Arc<MockTransport>) -> CaseView {
        let client = ApiClient::new(mock.clone(), SessionContext::new());
        CaseView::new(CaseWorkflow::new(client), CaseId::new("c1"))
    }

    #[tokio::test]
    async fn test_failed_request_keeps_status() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("created"));
        mock.fail(HttpMethod::Post, "/cases/c1/links", "connection reset");
        let mut view = view(&mock);

        assert!(view.load().await);
        assert!(!view.act(CaseTrigger::SendLink).await);
        assert_eq!(view.status(), Some(CaseStatus::Created));
        let toast = view.notifier().last().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.message, "网络连接失败，请检查网络");
    }

    #[tokio::test]
    async fn test_illegal_action_is_toast_only() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("created"));
        let mut view = view(&mock);
        view.load().await;

        assert!(!view.act(CaseTrigger::Complete).await);
        assert_eq!(view.status(), Some(CaseStatus::Created));
        assert!(mock.mutations().is_empty());
        assert_eq!(view.notifier().last().unwrap().message, "当前状态下无法执行该操作");
    }

    #[tokio::test]
    async fn test_success_updates_from_refetch() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("created"));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("created"));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("link_sent"));
        mock.respond(
            HttpMethod::Post,
            "/cases/c1/links",
            201,
            json!({
                "case_id": "c1", "token": "t1", "expires_at": "2030-01-01T00:00:00Z",
                "status": "active", "access_url": "https://visa.example/fill/t1"
            }),
        );
        let mut view = view(&mock);
        view.load().await;
        assert_eq!(view.available_actions(), vec![CaseTrigger::SendLink, CaseTrigger::Cancel]);

        assert!(view.act(CaseTrigger::SendLink).await);
        assert_eq!(view.status(), Some(CaseStatus::LinkSent));
        assert_eq!(view.status_label(), Some("链接已发送"));
        assert_eq!(view.notifier().last().unwrap().level, ToastLevel::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_watch() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("ai_processing"));
        let mut view = view(&mock);
        view.watch_ai(PollConfig {
            interval: Duration::from_secs(5),
            window: Duration::from_secs(600),
        });

        tokio::time::sleep(Duration::from_secs(12)).await;
        let seen = mock.count(HttpMethod::Get, "/cases/c1");
        assert_eq!(seen, 3);
        assert!(view.is_watching());

        drop(view);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.count(HttpMethod::Get, "/cases/c1"), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_settles_when_job_done() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("ai_processing"));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("consultant_final_review"));
        let mut view = view(&mock);
        view.watch_ai(PollConfig::default());

        assert!(view.settle_watch().await);
        assert_eq!(view.status(), Some(CaseStatus::ConsultantFinalReview));
    }
}
