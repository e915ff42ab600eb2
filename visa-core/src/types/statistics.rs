//! Dashboard Statistics Types

use serde::{Deserialize, Serialize};

use super::case::VisaType;
use crate::lifecycle::CaseStatus;

/// Headline counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsOverview {
    pub total_cases: u64,
    pub active_cases: u64,
    pub completed_cases: u64,
    pub pending_review: u64,
    #[serde(default)]
    pub new_this_month: u64,
}

impl StatisticsOverview {
    /// Completed share of all cases, in percent
    pub fn completion_rate(&self) -> f64 {
        if self.total_cases == 0 {
            return 0.0;
        }
        self.completed_cases as f64 * 100.0 / self.total_cases as f64
    }
}

/// One point of the case trend series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub created: u64,
    pub completed: u64,
}

/// Cases per status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: CaseStatus,
    pub count: u64,
}

/// Cases per visa type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisaTypeCount {
    pub visa_type: VisaType,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate() {
        let overview = StatisticsOverview {
            total_cases: 8,
            completed_cases: 2,
            ..Default::default()
        };
        assert!((overview.completion_rate() - 25.0).abs() < f64::EPSILON);
        assert_eq!(StatisticsOverview::default().completion_rate(), 0.0);
    }
}
