//! Case Workflow
//!
//! Drives status transitions against the backend:
//! 1. reject locally if the trigger is illegal or its guard fails
//! 2. send the request mapped to the trigger
//! 3. re-fetch the case, whatever the outcome
//!
//! No status is ever assumed from a request that has not been confirmed by
//! the re-fetch.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn, Instrument};
use visa_core::lifecycle::plan_transition;
use visa_core::logging::{operations, LogContext};
use visa_core::{
    Case, CaseId, CaseStatus, CaseTrigger, DiagnosisReport, GenerateLinkRequest, GuardContext, LinkToken,
    TriggerSource, VisaError,
};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::polling::{poll_until_complete, PollConfig};

type ActionKey = (CaseId, CaseTrigger);

/// Result of one transition request, after the authoritative re-fetch
#[derive(Debug)]
pub struct TransitionAttempt {
    pub trigger: CaseTrigger,
    pub from: CaseStatus,
    /// Status the trigger leads to locally
    pub requested: CaseStatus,
    /// Case as re-fetched after the request; `None` if the re-fetch failed
    pub case: Option<Case>,
    /// Outcome of the mutating request itself
    pub outcome: ClientResult<()>,
}

impl TransitionAttempt {
    /// Backend accepted the request and now reports the requested status
    pub fn applied(&self) -> bool {
        self.outcome.is_ok() && self.case.as_ref().map(|c| c.status) == Some(self.requested)
    }
}

/// Marks an action in flight until dropped
struct InFlight {
    set: Arc<Mutex<HashSet<ActionKey>>>,
    key: ActionKey,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[derive(Clone)]
pub struct CaseWorkflow {
    client: ApiClient,
    in_flight: Arc<Mutex<HashSet<ActionKey>>>,
}

impl CaseWorkflow {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Whether `trigger` is currently running for `case_id`
    pub fn is_in_flight(&self, case_id: &CaseId, trigger: CaseTrigger) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(case_id.clone(), trigger))
    }

    fn begin(&self, case_id: &CaseId, trigger: CaseTrigger) -> ClientResult<InFlight> {
        let key = (case_id.clone(), trigger);
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.clone()) {
            return Err(ClientError::ActionInFlight {
                action: trigger.as_str().to_string(),
            });
        }
        Ok(InFlight {
            set: self.in_flight.clone(),
            key,
        })
    }

    /// Request `trigger` on the case.
    ///
    /// `Err` means nothing was sent: the action was already running, the
    /// case could not be loaded, or the transition was rejected locally.
    pub async fn perform(&self, case_id: &CaseId, trigger: CaseTrigger) -> ClientResult<TransitionAttempt> {
        let span = LogContext::new(operations::CASE_TRANSITION).with_case_id(case_id).span();
        self.transition(case_id, trigger).instrument(span).await
    }

    async fn transition(&self, case_id: &CaseId, trigger: CaseTrigger) -> ClientResult<TransitionAttempt> {
        let _guard = self.begin(case_id, trigger)?;

        if trigger.source() == TriggerSource::System {
            return Err(VisaError::GuardRejected {
                trigger,
                reason: "driven by the backend".to_string(),
            }
            .into());
        }

        let case = self.client.cases().get(case_id).await?;
        let report = if needs_report(trigger) {
            self.client.diagnosis().latest(case_id).await?
        } else {
            None
        };
        let ctx = GuardContext {
            latest_report: report.as_ref(),
        };
        let requested = plan_transition(&case, trigger, &ctx).map_err(|e| {
            debug!(case_id = %case_id, trigger = %trigger, error = %e, "Transition rejected locally");
            ClientError::from(e)
        })?;

        let outcome = self.dispatch(&case, trigger, requested, report.as_ref()).await;
        if let Err(e) = &outcome {
            warn!(case_id = %case_id, trigger = %trigger, error = %e, "Transition request failed");
        }

        let refreshed = match self.client.cases().get(case_id).await {
            Ok(case) => Some(case),
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "Re-fetch after transition failed");
                None
            }
        };

        let attempt = TransitionAttempt {
            trigger,
            from: case.status,
            requested,
            case: refreshed,
            outcome,
        };
        if attempt.applied() {
            info!(
                case_id = %case_id,
                from = %attempt.from,
                to = %attempt.requested,
                trigger = %trigger,
                "Case transition confirmed"
            );
        }
        Ok(attempt)
    }

    async fn dispatch(
        &self,
        case: &Case,
        trigger: CaseTrigger,
        target: CaseStatus,
        report: Option<&DiagnosisReport>,
    ) -> ClientResult<()> {
        match trigger {
            CaseTrigger::SendLink => {
                self.client
                    .links()
                    .generate(&case.id, &GenerateLinkRequest::default())
                    .await?;
            }
            CaseTrigger::ClientOpenedLink => {
                let token = self.client_token(&case.id).await?;
                self.client.ds160().progress(&token).await?;
            }
            CaseTrigger::ClientSubmit => {
                let token = self.client_token(&case.id).await?;
                self.client.ds160().submit(&token).await?;
            }
            CaseTrigger::ConfirmSubmission => {
                self.client.diagnosis().start(&case.id).await?;
            }
            CaseTrigger::StartAiProcessing => {
                let report = report.ok_or_else(|| missing_report(trigger))?;
                self.client.diagnosis().generate(&report.id).await?;
            }
            CaseTrigger::SendToClient => {
                let report = report.ok_or_else(|| missing_report(trigger))?;
                self.client.diagnosis().send_to_client(&report.id).await?;
            }
            _ => {
                self.client.cases().update_status(&case.id, target).await?;
            }
        }
        Ok(())
    }

    /// Token of the wizard session for the case, else its active link
    async fn client_token(&self, case_id: &CaseId) -> ClientResult<LinkToken> {
        if let Some(session) = self.client.session().wizard().await {
            if session.case_id.as_ref().map_or(true, |id| id == case_id) {
                return Ok(session.client_token);
            }
        }
        let links = self.client.links();
        if let Some(link) = links.known_active(case_id) {
            return Ok(link.token);
        }
        let link = links.current(case_id).await?.ok_or_else(|| {
            ClientError::Core(VisaError::GuardRejected {
                trigger: CaseTrigger::ClientSubmit,
                reason: "case has no active link".to_string(),
            })
        })?;
        link.ensure_usable(Utc::now())?;
        Ok(link.token)
    }

    /// Wait for the running AI job of the case to resolve, then re-fetch it.
    ///
    /// Returns the case unchanged if no job is running.
    pub async fn await_ai(&self, case_id: &CaseId, config: &PollConfig) -> ClientResult<Case> {
        let case = self.client.cases().get(case_id).await?;
        match case.status {
            CaseStatus::AiReviewing => {
                self.client.diagnosis().wait_for_report(case_id, config).await?;
                self.client.cases().get(case_id).await
            }
            CaseStatus::AiProcessing => {
                poll_until_complete(config, || async {
                    let case = self.client.cases().get(case_id).await?;
                    Ok((!case.status.is_ai_pending()).then_some(case))
                })
                .await
            }
            _ => Ok(case),
        }
    }
}

fn needs_report(trigger: CaseTrigger) -> bool {
    matches!(
        trigger,
        CaseTrigger::RequestSupplement
            | CaseTrigger::ApproveMaterials
            | CaseTrigger::StartAiProcessing
            | CaseTrigger::SendToClient
    )
}

fn missing_report(trigger: CaseTrigger) -> ClientError {
    VisaError::GuardRejected {
        trigger,
        reason: "no diagnosis report".to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::session::SessionContext;
    use crate::transport::{HttpMethod, RequestBody};
    use serde_json::{json, Value};
    use visa_core::LinkStatus;

    fn case_json(status: &str, round: u32) -> Value {
        json!({
            "id": "c1", "case_number": "VC-2025-000001",
            "organization_id": "o1", "consultant_id": "u1",
            "visa_type": "B1_B2", "status": status, "review_round": round,
            "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    fn report_json(round: u32, blocker_fixed: bool) -> Value {
        json!({
            "id": "r1", "case_id": "c1", "review_round": round, "risk_score": 40,
            "issues": [
                { "id": "i1", "field_name": "passport_number", "severity": "blocker",
                  "description": "expired", "fixed": blocker_fixed },
                { "id": "i2", "field_name": "email", "severity": "warning", "description": "typo" }
            ],
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    fn workflow(mock: &Arc<MockTransport>) -> CaseWorkflow {
        CaseWorkflow::new(ApiClient::new(mock.clone(), SessionContext::new()))
    }

    #[tokio::test]
    async fn test_illegal_trigger_sends_nothing() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("created", 1));
        let workflow = workflow(&mock);

        let err = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ApproveFinal)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(VisaError::InvalidTransition { .. })));
        assert!(mock.mutations().is_empty());
        assert!(!workflow.is_in_flight(&CaseId::new("c1"), CaseTrigger::ApproveFinal));
    }

    #[tokio::test]
    async fn test_guard_blocks_unfixed_blockers() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("consultant_reviewing", 1));
        mock.respond(HttpMethod::Get, "/cases/c1/diagnosis/latest", 200, report_json(1, false));
        let workflow = workflow(&mock);

        let err = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ApproveMaterials)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(VisaError::GuardRejected { .. })));
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_ai_processing_without_report_sends_nothing() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("materials_approved", 1));
        let workflow = workflow(&mock);

        let err = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::StartAiProcessing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(VisaError::GuardRejected { trigger: CaseTrigger::StartAiProcessing, .. })
        ));
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_expired_link_blocks_client_submit() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("client_filling", 1));
        mock.respond(
            HttpMethod::Get,
            "/cases/c1/links/current",
            200,
            json!({
                "case_id": "c1", "token": "t1", "status": "active",
                "expires_at": "2020-01-01T00:00:00Z",
                "access_url": "https://app.example.com/fill/t1"
            }),
        );
        let workflow = workflow(&mock);

        let attempt = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ClientSubmit)
            .await
            .unwrap();
        assert!(!attempt.applied());
        assert!(matches!(
            attempt.outcome,
            Err(ClientError::Core(VisaError::LinkNotUsable { status: LinkStatus::Expired }))
        ));
        assert!(mock.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_approve_refetches_authoritative_status() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("consultant_reviewing", 1));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("materials_approved", 1));
        mock.respond(HttpMethod::Get, "/cases/c1/diagnosis/latest", 200, report_json(1, true));
        mock.respond(HttpMethod::Patch, "/cases/c1", 200, json!(null));
        let workflow = workflow(&mock);

        let attempt = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ApproveMaterials)
            .await
            .unwrap();
        assert!(attempt.applied());
        assert_eq!(attempt.case.unwrap().status, CaseStatus::MaterialsApproved);

        let patch = &mock.mutations()[0];
        assert_eq!(patch.body, RequestBody::Json(json!({ "status": "materials_approved" })));
        assert_eq!(mock.count(HttpMethod::Get, "/cases/c1"), 2);
    }

    #[tokio::test]
    async fn test_backend_rejection_still_refetches() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("client_submitted", 1));
        mock.respond(HttpMethod::Post, "/cases/c1/diagnosis", 409, json!({ "detail": "already running" }));
        let workflow = workflow(&mock);

        let attempt = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ConfirmSubmission)
            .await
            .unwrap();
        assert!(!attempt.applied());
        assert!(matches!(attempt.outcome, Err(ClientError::Api { status: 409, .. })));
        assert_eq!(attempt.case.unwrap().status, CaseStatus::ClientSubmitted);
        assert_eq!(mock.count(HttpMethod::Get, "/cases/c1"), 2);
    }

    #[tokio::test]
    async fn test_system_triggers_rejected() {
        let mock = Arc::new(MockTransport::new());
        let workflow = workflow(&mock);
        let err = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::AiReviewCompleted)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(VisaError::GuardRejected { .. })));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_same_action_gated_while_in_flight() {
        let mock = Arc::new(MockTransport::new());
        let workflow = workflow(&mock);
        let case_id = CaseId::new("c1");

        let held = workflow.begin(&case_id, CaseTrigger::ConfirmSubmission).unwrap();
        assert!(workflow.is_in_flight(&case_id, CaseTrigger::ConfirmSubmission));
        let err = workflow
            .perform(&case_id, CaseTrigger::ConfirmSubmission)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ActionInFlight { .. }));
        assert!(mock.requests().is_empty());

        // Other actions on the same case are not blocked
        assert!(workflow.begin(&case_id, CaseTrigger::Cancel).is_ok());
        drop(held);
        assert!(!workflow.is_in_flight(&case_id, CaseTrigger::ConfirmSubmission));
    }

    #[tokio::test]
    async fn test_client_submit_uses_wizard_token() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("client_filling", 1));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("client_submitted", 1));
        mock.respond(HttpMethod::Post, "/ds160/t1/submit", 200, json!({ "case_status": "client_submitted" }));
        let workflow = workflow(&mock);
        workflow
            .client()
            .session()
            .set_wizard(LinkToken::new("t1"), Some(CaseId::new("c1")))
            .await;

        let attempt = workflow
            .perform(&CaseId::new("c1"), CaseTrigger::ClientSubmit)
            .await
            .unwrap();
        assert!(attempt.applied());
        assert_eq!(mock.count(HttpMethod::Post, "/ds160/t1/submit"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_ai_review() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("ai_reviewing", 1));
        mock.respond(HttpMethod::Get, "/cases/c1", 200, case_json("consultant_reviewing", 1));
        mock.respond(HttpMethod::Get, "/cases/c1/diagnosis/status", 200, json!({ "status": "completed" }));
        mock.respond(HttpMethod::Get, "/cases/c1/diagnosis/latest", 200, report_json(1, false));
        let workflow = workflow(&mock);

        let case = workflow
            .await_ai(&CaseId::new("c1"), &PollConfig::default())
            .await
            .unwrap();
        assert_eq!(case.status, CaseStatus::ConsultantReviewing);
    }
}
