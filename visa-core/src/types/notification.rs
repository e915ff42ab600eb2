//! Notification Types

use serde::{Deserialize, Serialize};

use super::common::*;

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    System,
    CaseUpdate,
    ClientSubmission,
    DiagnosisReady,
    TranslationReady,
    LinkExpiring,
}

/// Inbox entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub case_id: Option<CaseId>,
    #[serde(default)]
    pub read: bool,
    pub created_at: Timestamp,
}

/// Create notification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<CaseId>,
}

/// Unread counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: u64,
}
