//! Basic Types
//!
//! Naming conventions:
//! - `_id` suffix: Primary key identifiers
//! - `_at` suffix: UTC timestamps
//! - `_date` suffix: calendar dates (`YYYY-MM-DD`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp used across the model
pub type Timestamp = DateTime<Utc>;

// ============================================================
// Identifier newtypes (non-interchangeable)
// ============================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Case ID
    CaseId
);
string_id!(
    /// Organization (tenant) ID
    OrganizationId
);
string_id!(
    /// Consultant (user) ID
    ConsultantId
);
string_id!(
    /// Applicant ID
    ApplicantId
);
string_id!(
    /// Opaque client link token
    LinkToken
);
string_id!(
    /// Diagnosis report ID
    ReportId
);
string_id!(
    /// Diagnosis issue ID
    IssueId
);
string_id!(
    /// Attachment (stored file) ID
    AttachmentId
);
string_id!(
    /// Translation field ID
    TranslationFieldId
);
string_id!(
    /// Notification ID
    NotificationId
);

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: u64,
    /// Current page (1-based)
    pub page: u32,
    /// Page size
    pub per_page: u32,
}

impl<T> Paginated<T> {
    /// Number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    /// Whether a following page exists
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = CaseId::new("case-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"case-42\"");
        assert_eq!(id.to_string(), "case-42");
    }

    #[test]
    fn test_pagination_pages() {
        let page: Paginated<u8> = Paginated {
            items: vec![1, 2],
            total: 41,
            page: 2,
            per_page: 20,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }
}
