//! Transition guards and case mutation
//!
//! A transition is applied only when the (status, trigger) pair is in the
//! table and its guard holds. A rejected transition leaves the case
//! untouched.

use tracing::{debug, info};

use super::status::{is_backward_edge, CaseStatus, CaseTrigger};
use crate::error::{VisaError, VisaResult};
use crate::types::{ActivityEntry, Actor, Case, DiagnosisReport, Timestamp};

/// Facts a guard may need beyond the case itself
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardContext<'a> {
    /// Latest diagnosis report known for the case
    pub latest_report: Option<&'a DiagnosisReport>,
}

impl<'a> GuardContext<'a> {
    pub fn with_report(report: &'a DiagnosisReport) -> Self {
        Self {
            latest_report: Some(report),
        }
    }

    fn report_for_round(&self, round: u32) -> Option<&'a DiagnosisReport> {
        self.latest_report.filter(|r| r.review_round == round)
    }
}

/// Check the local precondition of `trigger` for `case`
pub fn check_guard(case: &Case, trigger: CaseTrigger, ctx: &GuardContext<'_>) -> VisaResult<()> {
    let reject = |reason: &str| VisaError::GuardRejected {
        trigger,
        reason: reason.to_string(),
    };

    match trigger {
        CaseTrigger::RequestSupplement => {
            ctx.report_for_round(case.review_round)
                .ok_or_else(|| reject("no diagnosis report for the current review round"))?;
        }
        CaseTrigger::ApproveMaterials => {
            let report = ctx
                .report_for_round(case.review_round)
                .ok_or_else(|| reject("no diagnosis report for the current review round"))?;
            let open = report.unfixed_blockers().count();
            if open > 0 {
                return Err(reject(&format!("{} blocker issue(s) not fixed", open)));
            }
        }
        CaseTrigger::StartAiProcessing => {
            ctx.latest_report
                .ok_or_else(|| reject("no diagnosis report to process"))?;
        }
        CaseTrigger::SendToClient => {
            ctx.latest_report
                .ok_or_else(|| reject("no diagnosis report to send"))?;
        }
        _ => {}
    }
    Ok(())
}

/// Resolve the target status of `trigger`, checking legality then guard
pub fn plan_transition(case: &Case, trigger: CaseTrigger, ctx: &GuardContext<'_>) -> VisaResult<CaseStatus> {
    if case.status.is_terminal() {
        return Err(VisaError::TerminalStatus { status: case.status });
    }
    let target = case
        .status
        .next(trigger)
        .ok_or(VisaError::InvalidTransition {
            from: case.status,
            trigger,
        })?;
    check_guard(case, trigger, ctx)?;
    Ok(target)
}

impl Case {
    /// Apply `trigger`, returning the activity entry to append to the timeline.
    ///
    /// Re-entering `client_submitted` from `need_supplement` opens a new review round.
    pub fn apply(
        &mut self,
        trigger: CaseTrigger,
        ctx: &GuardContext<'_>,
        actor: Actor,
        now: Timestamp,
    ) -> VisaResult<ActivityEntry> {
        let target = plan_transition(self, trigger, ctx)?;
        let from = self.status;

        if from == CaseStatus::NeedSupplement && target == CaseStatus::ClientSubmitted {
            self.review_round += 1;
            debug!(case_id = %self.id, review_round = self.review_round, "Opened new review round");
        }
        self.status = target;
        self.updated_at = now;

        info!(
            case_id = %self.id,
            from = %from,
            to = %target,
            trigger = %trigger,
            backward = is_backward_edge(from, target),
            "Case status transition"
        );

        Ok(ActivityEntry {
            status: target,
            timestamp: now,
            actor,
            note: Some(trigger.label().to_string()),
        })
    }

    /// Whether `trigger` would currently be accepted
    pub fn can_apply(&self, trigger: CaseTrigger, ctx: &GuardContext<'_>) -> bool {
        plan_transition(self, trigger, ctx).is_ok()
    }
}
