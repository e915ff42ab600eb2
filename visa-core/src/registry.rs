//! Status Metadata Registry
//!
//! Single source for how a case status is presented: label, color, icon
//! and the consultant actions offered from it. Dashboard, case list and
//! case detail views all read from here.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::lifecycle::{CaseStatus, CaseTrigger, TriggerSource};

/// Presentation metadata for one status
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMeta {
    pub status: CaseStatus,
    /// 中文标签
    pub label: &'static str,
    pub label_en: &'static str,
    /// Badge color name
    pub color: &'static str,
    /// Icon name
    pub icon: &'static str,
    /// Consultant-initiated triggers legal from this status
    pub allowed_actions: Vec<CaseTrigger>,
}

impl StatusMeta {
    pub fn allows(&self, trigger: CaseTrigger) -> bool {
        self.allowed_actions.contains(&trigger)
    }
}

fn presentation(status: CaseStatus) -> (&'static str, &'static str, &'static str, &'static str) {
    match status {
        CaseStatus::Created => ("已创建", "Created", "gray", "file-plus"),
        CaseStatus::LinkSent => ("链接已发送", "Link sent", "blue", "link"),
        CaseStatus::ClientFilling => ("客户填写中", "Client filling", "cyan", "edit"),
        CaseStatus::ClientSubmitted => ("客户已提交", "Client submitted", "indigo", "inbox"),
        CaseStatus::AiReviewing => ("AI审核中", "AI reviewing", "purple", "cpu"),
        CaseStatus::ConsultantReviewing => ("顾问审核中", "Consultant reviewing", "orange", "search"),
        CaseStatus::NeedSupplement => ("需补充材料", "Needs supplement", "red", "alert-circle"),
        CaseStatus::MaterialsApproved => ("材料确认无误", "Materials approved", "green", "check-circle"),
        CaseStatus::AiProcessing => ("AI处理中", "AI processing", "purple", "loader"),
        CaseStatus::ConsultantFinalReview => ("顾问终审中", "Final review", "orange", "clipboard"),
        CaseStatus::ConsultantFinalApproved => ("终审通过", "Final approved", "green", "award"),
        CaseStatus::SentToClient => ("已发送客户", "Sent to client", "blue", "send"),
        CaseStatus::ClientConfirmed => ("客户已确认", "Client confirmed", "teal", "thumbs-up"),
        CaseStatus::Completed => ("已完成", "Completed", "green", "check"),
        CaseStatus::Cancelled => ("已取消", "Cancelled", "gray", "x-circle"),
    }
}

static REGISTRY: Lazy<HashMap<CaseStatus, StatusMeta>> = Lazy::new(|| {
    CaseStatus::ALL
        .iter()
        .map(|&status| {
            let (label, label_en, color, icon) = presentation(status);
            let allowed_actions = status
                .allowed_triggers()
                .into_iter()
                .filter(|t| t.source() == TriggerSource::Consultant)
                .collect();
            (
                status,
                StatusMeta {
                    status,
                    label,
                    label_en,
                    color,
                    icon,
                    allowed_actions,
                },
            )
        })
        .collect()
});

/// Metadata for a status
pub fn status_meta(status: CaseStatus) -> &'static StatusMeta {
    // Every status is inserted when the registry is built.
    &REGISTRY[&status]
}

/// Metadata for every status in lifecycle order
pub fn all_status_meta() -> Vec<&'static StatusMeta> {
    CaseStatus::ALL.iter().map(|s| status_meta(*s)).collect()
}

impl CaseStatus {
    /// 中文标签
    pub fn label(&self) -> &'static str {
        status_meta(*self).label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_status_registered() {
        assert_eq!(all_status_meta().len(), CaseStatus::ALL.len());
    }

    #[test]
    fn test_labels() {
        assert_eq!(CaseStatus::MaterialsApproved.label(), "材料确认无误");
        assert_eq!(status_meta(CaseStatus::NeedSupplement).color, "red");
    }

    #[test]
    fn test_actions_are_consultant_only() {
        let meta = status_meta(CaseStatus::ConsultantReviewing);
        assert!(meta.allows(CaseTrigger::ApproveMaterials));
        assert!(meta.allows(CaseTrigger::RequestSupplement));
        assert!(meta.allows(CaseTrigger::Cancel));

        let filling = status_meta(CaseStatus::ClientFilling);
        assert!(!filling.allows(CaseTrigger::ClientSubmit));
        assert_eq!(filling.allowed_actions, vec![CaseTrigger::Cancel]);

        assert!(status_meta(CaseStatus::Completed).allowed_actions.is_empty());
    }
}
