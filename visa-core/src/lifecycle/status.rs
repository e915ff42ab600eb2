//! 案件状态机
//!
//! # 状态机
//!
//! ```text
//! created ──→ link_sent ──→ client_filling ──→ client_submitted ──→ ai_reviewing
//!                                                   ↑                    │
//!                                                   │                    ↓
//!                                           need_supplement ←── consultant_reviewing
//!                                                                        │
//!                                                                        ↓
//!               consultant_final_review ←── ai_processing ←── materials_approved
//!                 │        ↑    │                ↑
//!                 │        │    └────────────────┘
//!                 ↓        │
//!   consultant_final_approved ──→ sent_to_client ──→ client_confirmed ──→ completed
//!
//!   任意非终态 ──cancel──→ cancelled
//! ```
//!
//! The only backward edges are the supplement cycle
//! (`need_supplement → client_submitted`) and the final review cycles
//! (`consultant_final_review → ai_processing`,
//! `sent_to_client → consultant_final_review`).

use serde::{Deserialize, Serialize};

use crate::error::{VisaError, VisaResult};

/// Case lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// 已创建
    #[default]
    Created,
    /// 链接已发送
    LinkSent,
    /// 客户填写中
    ClientFilling,
    /// 客户已提交
    ClientSubmitted,
    /// AI审核中
    AiReviewing,
    /// 顾问审核中
    ConsultantReviewing,
    /// 需补充材料
    NeedSupplement,
    /// 材料确认无误
    MaterialsApproved,
    /// AI处理中
    AiProcessing,
    /// 顾问终审中
    ConsultantFinalReview,
    /// 终审通过
    ConsultantFinalApproved,
    /// 已发送客户
    SentToClient,
    /// 客户已确认
    ClientConfirmed,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl CaseStatus {
    /// All statuses in lifecycle order
    pub const ALL: [CaseStatus; 15] = [
        Self::Created,
        Self::LinkSent,
        Self::ClientFilling,
        Self::ClientSubmitted,
        Self::AiReviewing,
        Self::ConsultantReviewing,
        Self::NeedSupplement,
        Self::MaterialsApproved,
        Self::AiProcessing,
        Self::ConsultantFinalReview,
        Self::ConsultantFinalApproved,
        Self::SentToClient,
        Self::ClientConfirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::LinkSent => "link_sent",
            Self::ClientFilling => "client_filling",
            Self::ClientSubmitted => "client_submitted",
            Self::AiReviewing => "ai_reviewing",
            Self::ConsultantReviewing => "consultant_reviewing",
            Self::NeedSupplement => "need_supplement",
            Self::MaterialsApproved => "materials_approved",
            Self::AiProcessing => "ai_processing",
            Self::ConsultantFinalReview => "consultant_final_review",
            Self::ConsultantFinalApproved => "consultant_final_approved",
            Self::SentToClient => "sent_to_client",
            Self::ClientConfirmed => "client_confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from wire name (also accepts the upper case constant form)
    pub fn parse(s: &str) -> VisaResult<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| VisaError::UnknownStatus {
                value: s.to_string(),
            })
    }

    /// 是否是终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Waiting on an asynchronous backend job
    pub fn is_ai_pending(&self) -> bool {
        matches!(self, Self::AiReviewing | Self::AiProcessing)
    }

    /// Waiting on the applicant
    pub fn awaits_client(&self) -> bool {
        matches!(
            self,
            Self::LinkSent | Self::ClientFilling | Self::NeedSupplement | Self::SentToClient
        )
    }

    /// Target of `trigger` from this status, if the pair is in the transition table
    pub fn next(&self, trigger: CaseTrigger) -> Option<CaseStatus> {
        TRANSITIONS
            .iter()
            .find(|t| t.from == *self && t.trigger == trigger)
            .map(|t| t.to)
            .or_else(|| {
                (trigger == CaseTrigger::Cancel && !self.is_terminal()).then_some(Self::Cancelled)
            })
    }

    /// 是否可以转换到目标状态
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        self.allowed_triggers()
            .iter()
            .any(|trigger| self.next(*trigger) == Some(target))
    }

    /// Triggers legal from this status
    pub fn allowed_triggers(&self) -> Vec<CaseTrigger> {
        CaseTrigger::ALL
            .iter()
            .copied()
            .filter(|trigger| self.next(*trigger).is_some())
            .collect()
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = VisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Who initiates a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Explicit consultant action in the dashboard
    Consultant,
    /// Applicant action through the client link
    Client,
    /// Asynchronous backend completion event, observed by polling
    System,
}

/// Event driving a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseTrigger {
    SendLink,
    ClientOpenedLink,
    ClientSubmit,
    ConfirmSubmission,
    AiReviewCompleted,
    RequestSupplement,
    ApproveMaterials,
    StartAiProcessing,
    AiProcessingCompleted,
    RequestReprocessing,
    ApproveFinal,
    SendToClient,
    ClientRequestChanges,
    ClientConfirm,
    Complete,
    Cancel,
}

impl CaseTrigger {
    pub const ALL: [CaseTrigger; 16] = [
        Self::SendLink,
        Self::ClientOpenedLink,
        Self::ClientSubmit,
        Self::ConfirmSubmission,
        Self::AiReviewCompleted,
        Self::RequestSupplement,
        Self::ApproveMaterials,
        Self::StartAiProcessing,
        Self::AiProcessingCompleted,
        Self::RequestReprocessing,
        Self::ApproveFinal,
        Self::SendToClient,
        Self::ClientRequestChanges,
        Self::ClientConfirm,
        Self::Complete,
        Self::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendLink => "send_link",
            Self::ClientOpenedLink => "client_opened_link",
            Self::ClientSubmit => "client_submit",
            Self::ConfirmSubmission => "confirm_submission",
            Self::AiReviewCompleted => "ai_review_completed",
            Self::RequestSupplement => "request_supplement",
            Self::ApproveMaterials => "approve_materials",
            Self::StartAiProcessing => "start_ai_processing",
            Self::AiProcessingCompleted => "ai_processing_completed",
            Self::RequestReprocessing => "request_reprocessing",
            Self::ApproveFinal => "approve_final",
            Self::SendToClient => "send_to_client",
            Self::ClientRequestChanges => "client_request_changes",
            Self::ClientConfirm => "client_confirm",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    pub fn parse(s: &str) -> VisaResult<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| VisaError::UnknownTrigger {
                value: s.to_string(),
            })
    }

    /// Who may fire this trigger
    pub fn source(&self) -> TriggerSource {
        match self {
            Self::ClientOpenedLink
            | Self::ClientSubmit
            | Self::ClientRequestChanges
            | Self::ClientConfirm => TriggerSource::Client,
            Self::AiReviewCompleted | Self::AiProcessingCompleted => TriggerSource::System,
            _ => TriggerSource::Consultant,
        }
    }

    /// 操作名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::SendLink => "发送填写链接",
            Self::ClientOpenedLink => "客户打开链接",
            Self::ClientSubmit => "客户提交资料",
            Self::ConfirmSubmission => "确认客户提交",
            Self::AiReviewCompleted => "AI审核完成",
            Self::RequestSupplement => "要求补充材料",
            Self::ApproveMaterials => "确认材料无误",
            Self::StartAiProcessing => "生成申请表",
            Self::AiProcessingCompleted => "AI处理完成",
            Self::RequestReprocessing => "重新生成",
            Self::ApproveFinal => "终审通过",
            Self::SendToClient => "发送给客户",
            Self::ClientRequestChanges => "客户要求修改",
            Self::ClientConfirm => "客户确认",
            Self::Complete => "完成案件",
            Self::Cancel => "取消案件",
        }
    }
}

impl std::fmt::Display for CaseTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CaseTrigger {
    type Err = VisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One row of the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CaseStatus,
    pub trigger: CaseTrigger,
    pub to: CaseStatus,
}

const fn t(from: CaseStatus, trigger: CaseTrigger, to: CaseStatus) -> Transition {
    Transition { from, trigger, to }
}

/// Legal transitions, excluding the implicit `cancel` edge from every non-terminal status
pub const TRANSITIONS: &[Transition] = &[
    t(CaseStatus::Created, CaseTrigger::SendLink, CaseStatus::LinkSent),
    t(CaseStatus::LinkSent, CaseTrigger::ClientOpenedLink, CaseStatus::ClientFilling),
    t(CaseStatus::ClientFilling, CaseTrigger::ClientSubmit, CaseStatus::ClientSubmitted),
    t(CaseStatus::ClientSubmitted, CaseTrigger::ConfirmSubmission, CaseStatus::AiReviewing),
    t(CaseStatus::AiReviewing, CaseTrigger::AiReviewCompleted, CaseStatus::ConsultantReviewing),
    t(CaseStatus::ConsultantReviewing, CaseTrigger::RequestSupplement, CaseStatus::NeedSupplement),
    t(CaseStatus::ConsultantReviewing, CaseTrigger::ApproveMaterials, CaseStatus::MaterialsApproved),
    t(CaseStatus::NeedSupplement, CaseTrigger::ClientSubmit, CaseStatus::ClientSubmitted),
    t(CaseStatus::MaterialsApproved, CaseTrigger::StartAiProcessing, CaseStatus::AiProcessing),
    t(CaseStatus::AiProcessing, CaseTrigger::AiProcessingCompleted, CaseStatus::ConsultantFinalReview),
    t(CaseStatus::ConsultantFinalReview, CaseTrigger::RequestReprocessing, CaseStatus::AiProcessing),
    t(CaseStatus::ConsultantFinalReview, CaseTrigger::ApproveFinal, CaseStatus::ConsultantFinalApproved),
    t(CaseStatus::ConsultantFinalApproved, CaseTrigger::SendToClient, CaseStatus::SentToClient),
    t(CaseStatus::SentToClient, CaseTrigger::ClientRequestChanges, CaseStatus::ConsultantFinalReview),
    t(CaseStatus::SentToClient, CaseTrigger::ClientConfirm, CaseStatus::ClientConfirmed),
    t(CaseStatus::ClientConfirmed, CaseTrigger::Complete, CaseStatus::Completed),
];

/// Whether `from → to` is one of the backward (cyclic) edges
pub fn is_backward_edge(from: CaseStatus, to: CaseStatus) -> bool {
    matches!(
        (from, to),
        (CaseStatus::NeedSupplement, CaseStatus::ClientSubmitted)
            | (CaseStatus::ConsultantFinalReview, CaseStatus::AiProcessing)
            | (CaseStatus::SentToClient, CaseStatus::ConsultantFinalReview)
    )
}
