//! CaseLink - 客户填写链接
//!
//! A time-boxed capability token granting the applicant access to the
//! fill-in wizard for exactly one case.
//!
//! # 状态机
//!
//! ```text
//! active ──┬──→ used
//!          ├──→ expired
//!          └──→ revoked
//! ```
//!
//! At most one link per case is active at a time; issuing a new link
//! supersedes (revokes) the previous one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::common::*;
use crate::error::{VisaError, VisaResult};

/// Link status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// 有效
    #[default]
    Active,
    /// 已使用（客户已完成提交）
    Used,
    /// 已过期
    Expired,
    /// 已撤销
    Revoked,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// 是否是终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// 是否可以转换到目标状态
    pub fn can_transition_to(&self, target: LinkStatus) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Used) | (Self::Active, Self::Expired) | (Self::Active, Self::Revoked)
        )
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client access link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLink {
    pub case_id: CaseId,
    pub token: LinkToken,
    pub expires_at: Timestamp,
    pub status: LinkStatus,
    pub access_url: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl CaseLink {
    /// Status as observed at `now`: an active link past its expiry reads as expired
    pub fn effective_status(&self, now: Timestamp) -> LinkStatus {
        if self.status == LinkStatus::Active && now >= self.expires_at {
            LinkStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether the client may still open the wizard with this link
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.effective_status(now) == LinkStatus::Active
    }

    /// Ensure the link can be used, returning its effective status otherwise
    pub fn ensure_usable(&self, now: Timestamp) -> VisaResult<()> {
        match self.effective_status(now) {
            LinkStatus::Active => Ok(()),
            status => Err(VisaError::LinkNotUsable { status }),
        }
    }

    /// Move to a new status
    pub fn transition_to(&mut self, new_status: LinkStatus) -> VisaResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(VisaError::InvalidLinkTransition {
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Time remaining before expiry, zero when already expired
    pub fn remaining(&self, now: Timestamp) -> chrono::Duration {
        let left = self.expires_at - now;
        if left < chrono::Duration::zero() {
            chrono::Duration::zero()
        } else {
            left
        }
    }
}

/// Generate link request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLinkRequest {
    /// Validity in days
    pub expires_in_days: u32,
}

impl Default for GenerateLinkRequest {
    fn default() -> Self {
        Self { expires_in_days: 7 }
    }
}

/// Per-case link ledger enforcing the single-active-link rule
#[derive(Debug, Default)]
pub struct LinkBook {
    links: HashMap<CaseId, Vec<CaseLink>>,
}

impl LinkBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly issued link, revoking any link still active for the case.
    ///
    /// Returns the superseded link, if there was one.
    pub fn issue(&mut self, link: CaseLink) -> Option<CaseLink> {
        let history = self.links.entry(link.case_id.clone()).or_default();
        let mut superseded = None;
        for previous in history.iter_mut() {
            if previous.status == LinkStatus::Active {
                previous.status = LinkStatus::Revoked;
                superseded = Some(previous.clone());
            }
        }
        history.push(link);
        superseded
    }

    /// Record a link read back from the backend.
    ///
    /// A known token takes the fetched status; an unknown one is issued.
    pub fn observe(&mut self, link: CaseLink) -> Option<CaseLink> {
        let known = self
            .links
            .get_mut(&link.case_id)
            .and_then(|history| history.iter_mut().find(|l| l.token == link.token));
        match known {
            Some(existing) => {
                existing.status = link.status;
                None
            }
            None => self.issue(link),
        }
    }

    /// The active link of a case, if any is still usable at `now`
    pub fn active(&self, case_id: &CaseId, now: Timestamp) -> Option<&CaseLink> {
        self.links
            .get(case_id)
            .and_then(|history| history.iter().rev().find(|l| l.is_usable(now)))
    }

    /// Find a link by token
    pub fn find(&self, token: &LinkToken) -> Option<&CaseLink> {
        self.links.values().flatten().find(|l| &l.token == token)
    }

    /// Apply a status change to the link with `token`
    pub fn set_status(&mut self, token: &LinkToken, status: LinkStatus) -> VisaResult<()> {
        let link = self
            .links
            .values_mut()
            .flatten()
            .find(|l| &l.token == token)
            .ok_or(VisaError::LinkNotUsable {
                status: LinkStatus::Revoked,
            })?;
        link.transition_to(status)
    }

    /// Mark active links past their expiry as expired; returns how many changed
    pub fn expire_due(&mut self, now: Timestamp) -> usize {
        let mut count = 0;
        for link in self.links.values_mut().flatten() {
            if link.status == LinkStatus::Active && now >= link.expires_at {
                link.status = LinkStatus::Expired;
                count += 1;
            }
        }
        count
    }

    /// Number of active links for a case (always 0 or 1)
    pub fn active_count(&self, case_id: &CaseId) -> usize {
        self.links
            .get(case_id)
            .map(|h| h.iter().filter(|l| l.status == LinkStatus::Active).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn link(case: &str, token: &str, expires_at: Timestamp) -> CaseLink {
        CaseLink {
            case_id: CaseId::new(case),
            token: LinkToken::new(token),
            expires_at,
            status: LinkStatus::Active,
            access_url: format!("https://app.example.com/fill/{}", token),
            created_at: None,
        }
    }

    #[test]
    fn test_expired_link_not_usable() {
        let now = Utc::now();
        let l = link("c1", "t1", now - Duration::minutes(1));
        assert_eq!(l.effective_status(now), LinkStatus::Expired);
        assert!(!l.is_usable(now));
        assert_eq!(
            l.ensure_usable(now),
            Err(VisaError::LinkNotUsable {
                status: LinkStatus::Expired
            })
        );
        assert_eq!(l.remaining(now), Duration::zero());
    }

    #[test]
    fn test_link_terminal_transitions() {
        let now = Utc::now();
        let mut l = link("c1", "t1", now + Duration::days(7));
        l.transition_to(LinkStatus::Used).unwrap();
        assert!(l.transition_to(LinkStatus::Active).is_err());
        assert!(l.transition_to(LinkStatus::Revoked).is_err());
    }

    #[test]
    fn test_new_link_supersedes_previous() {
        let now = Utc::now();
        let mut book = LinkBook::new();
        let case_id = CaseId::new("c1");

        assert!(book.issue(link("c1", "t1", now + Duration::days(7))).is_none());
        let superseded = book.issue(link("c1", "t2", now + Duration::days(7))).unwrap();

        assert_eq!(superseded.token.as_str(), "t1");
        assert_eq!(book.active_count(&case_id), 1);
        assert_eq!(book.active(&case_id, now).unwrap().token.as_str(), "t2");
        assert_eq!(book.find(&LinkToken::new("t1")).unwrap().status, LinkStatus::Revoked);
    }

    #[test]
    fn test_expire_due() {
        let now = Utc::now();
        let mut book = LinkBook::new();
        book.issue(link("c1", "t1", now - Duration::seconds(1)));
        book.issue(link("c2", "t2", now + Duration::days(1)));
        assert_eq!(book.expire_due(now), 1);
        assert!(book.active(&CaseId::new("c1"), now).is_none());
        assert!(book.active(&CaseId::new("c2"), now).is_some());
    }

    #[test]
    fn test_observe_known_token_takes_fetched_status() {
        let now = Utc::now();
        let mut book = LinkBook::new();
        book.issue(link("c1", "t1", now + Duration::days(7)));

        let mut used = link("c1", "t1", now + Duration::days(7));
        used.status = LinkStatus::Used;
        assert!(book.observe(used).is_none());
        assert_eq!(book.find(&LinkToken::new("t1")).unwrap().status, LinkStatus::Used);
        assert_eq!(book.active_count(&CaseId::new("c1")), 0);

        assert!(book.observe(link("c1", "t2", now + Duration::days(7))).is_none());
        assert_eq!(book.active(&CaseId::new("c1"), now).unwrap().token.as_str(), "t2");
    }
}
