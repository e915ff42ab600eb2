//! Case, Applicant and Activity Types

use serde::{Deserialize, Serialize};

use super::common::*;
use crate::lifecycle::CaseStatus;

/// Visa category requested by the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisaType {
    /// Business / tourism
    #[serde(rename = "B1_B2")]
    B1B2,
    B1,
    B2,
    F1,
    J1,
    H1B,
    L1,
    O1,
    Other,
}

impl VisaType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B1B2 => "B1_B2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::F1 => "F1",
            Self::J1 => "J1",
            Self::H1B => "H1B",
            Self::L1 => "L1",
            Self::O1 => "O1",
            Self::Other => "OTHER",
        }
    }

    /// Parse from wire name (case-insensitive, `-` accepted for `_`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "B1_B2" | "B1B2" => Some(Self::B1B2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "F1" => Some(Self::F1),
            "J1" => Some(Self::J1),
            "H1B" => Some(Self::H1B),
            "L1" => Some(Self::L1),
            "O1" => Some(Self::O1),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::B1B2 => "商务/旅游签证 (B1/B2)",
            Self::B1 => "商务签证 (B1)",
            Self::B2 => "旅游签证 (B2)",
            Self::F1 => "学生签证 (F1)",
            Self::J1 => "交流访问签证 (J1)",
            Self::H1B => "工作签证 (H1B)",
            Self::L1 => "跨国公司调派签证 (L1)",
            Self::O1 => "杰出人才签证 (O1)",
            Self::Other => "其他",
        }
    }
}

impl std::fmt::Display for VisaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Applicant identity record, owned 1:1 by a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: String,
    #[serde(default)]
    pub name_pinyin: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub passport_number: String,
}

/// A visa case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    /// Human readable number, e.g. `VC-2024-000123`
    pub case_number: String,
    pub organization_id: OrganizationId,
    pub consultant_id: ConsultantId,
    pub visa_type: VisaType,
    pub status: CaseStatus,
    /// Starts at 1, incremented each time the case re-enters review after a supplement cycle
    pub review_round: u32,
    #[serde(default)]
    pub applicant: Option<Applicant>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Applicant details captured by the new-case form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewApplicant {
    pub name: String,
    #[serde(default)]
    pub name_pinyin: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub passport_number: String,
}

/// Create case request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    pub visa_type: VisaType,
    pub applicant: NewApplicant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial case update (PATCH)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCaseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa_type: Option<VisaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultant_id: Option<ConsultantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateCaseRequest {
    /// Status-only update
    pub fn status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Case list query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseListQuery {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for CaseListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            sort_by: None,
            sort_order: SortOrder::Desc,
            status: None,
            search: None,
        }
    }
}

impl CaseListQuery {
    /// Render as query string pairs, skipping unset filters
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("sort_order".to_string(), self.sort_order.as_str().to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_string(), sort_by.clone()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search".to_string(), search.trim().to_string()));
        }
        pairs
    }
}

/// Who performed an action on a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Consultant(ConsultantId),
    Client(LinkToken),
    System,
}

impl Actor {
    pub fn name(&self) -> String {
        match self {
            Self::Consultant(id) => format!("consultant:{}", id),
            Self::Client(_) => "client".to_string(),
            Self::System => "system".to_string(),
        }
    }
}

/// One entry of the backend-owned activity timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub status: CaseStatus,
    pub timestamp: Timestamp,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
}

/// Stored file attached to a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub url: String,
    #[serde(default)]
    pub document_type: Option<String>,
    pub uploaded_at: Timestamp,
}
