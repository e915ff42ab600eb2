//! Request Retry Policy
//!
//! Only idempotent reads are retried, and only on 429/5xx. Delays double
//! from the initial delay up to the cap, with equal jitter applied.

use rand::Rng;
use std::time::Duration;

use crate::transport::HttpMethod;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Equal jitter: half the delay fixed, half random
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether a response with `status` to `method` may be retried
    pub fn should_retry(&self, method: HttpMethod, status: u16) -> bool {
        method.is_idempotent() && (status == 429 || (500..=599).contains(&status))
    }

    /// Delay before retry number `attempt` (1-based), before jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exp);
        let ms = ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(ms as u64)
    }

    /// Delay before retry number `attempt`, honouring a server hint
    pub fn delay_for_attempt(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }
        let base = self.base_delay(attempt);
        if !self.jitter {
            return base;
        }
        let half = base.as_millis() as u64 / 2;
        let extra = rand::thread_rng().gen_range(0..=half);
        Duration::from_millis(base.as_millis() as u64 - half + extra)
    }
}
