//! Status Polling
//!
//! Fixed-interval polling of a backend job until it reports completion.
//! Per-tick errors are swallowed, the loop is bounded by an observation
//! window, and a [`PollHandle`] stops all further requests when cancelled
//! or dropped.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Time between probes
    pub interval: Duration,
    /// Give up after this long
    pub window: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            window: Duration::from_secs(600),
        }
    }
}

/// Probe until it yields a value, first probe immediately.
///
/// `probe` returns `Ok(None)` while the job is still running.
pub async fn poll_until_complete<T, F, Fut>(config: &PollConfig, mut probe: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<Option<T>>>,
{
    let deadline = Instant::now() + config.window;
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u32;

    loop {
        ticker.tick().await;
        if Instant::now() >= deadline {
            warn!(ticks = tick, window_secs = config.window.as_secs(), "Polling window exhausted");
            return Err(ClientError::PollTimeout {
                seconds: config.window.as_secs(),
            });
        }

        tick += 1;
        match tokio::time::timeout_at(deadline, probe()).await {
            Ok(Ok(Some(value))) => {
                debug!(ticks = tick, "Polling complete");
                return Ok(value);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => debug!(tick, error = %e, "Poll tick failed"),
            Err(_) => {}
        }
    }
}

/// Background poll owned by a view; aborted on drop
pub struct PollHandle<T> {
    task: Option<JoinHandle<ClientResult<T>>>,
}

impl<T: Send + 'static> PollHandle<T> {
    pub fn spawn<F, Fut>(config: PollConfig, probe: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ClientResult<Option<T>>> + Send + 'static,
    {
        let task = tokio::spawn(async move { poll_until_complete(&config, probe).await });
        Self { task: Some(task) }
    }

    /// Stop polling; no request is issued after this returns
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Polling cancelled");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }

    /// Wait for the outcome
    pub async fn join(mut self) -> ClientResult<T> {
        let Some(task) = self.task.take() else {
            return Err(ClientError::Cancelled);
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Cancelled),
            Err(e) => Err(ClientError::JobFailed { message: e.to_string() }),
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
