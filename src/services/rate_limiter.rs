//! Sliding-log throttle for focus requests

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Accepts at most `max_requests` within any rolling `window`
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    log: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            log: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Record a request if the ceiling allows it.
    ///
    /// Check and record happen under one lock so concurrent callers cannot both
    /// take the last slot.
    pub async fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut log = self.log.lock().await;
        Self::prune(&mut log, now, self.window);

        if log.len() >= self.max_requests {
            debug!(
                recent = log.len(),
                limit = self.max_requests,
                "Focus request rejected by rate limiter"
            );
            return false;
        }

        log.push_back(now);
        true
    }

    /// Whether the ceiling is currently reached, without recording anything
    pub async fn is_exceeded(&self) -> bool {
        let mut log = self.log.lock().await;
        Self::prune(&mut log, Instant::now(), self.window);
        log.len() >= self.max_requests
    }

    pub async fn recent_requests(&self) -> usize {
        let mut log = self.log.lock().await;
        Self::prune(&mut log, Instant::now(), self.window);
        log.len()
    }

    pub async fn reset(&self) {
        self.log.lock().await.clear();
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn prune(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = log.front() {
            if now.duration_since(*oldest) >= window {
                log.pop_front();
            } else {
                break;
            }
        }
    }
}
