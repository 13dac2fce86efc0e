use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Sliding-window request limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    last_purge: Arc<Mutex<Instant>>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            buckets: Arc::new(DashMap::new()),
            last_purge: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Record a request for `client`. Returns whether it is admitted and how
    /// many requests remain in the current window.
    pub fn allow(&self, client: &str) -> (bool, u32) {
        let now = Instant::now();
        let window = self.window;

        let mut entry = self.buckets.entry(client.to_string()).or_default();
        entry.retain(|instant| now.duration_since(*instant) < window);

        let remaining = self.max_requests.saturating_sub(entry.len() as u32);
        if remaining == 0 {
            return (false, 0);
        }

        entry.push(now);
        (true, remaining.saturating_sub(1))
    }

    /// Drop clients whose every recorded request has left the window.
    pub fn purge_idle(&self) {
        let now = Instant::now();
        let window = self.window;
        self.buckets.retain(|_, hits| {
            hits.retain(|instant| now.duration_since(*instant) < window);
            !hits.is_empty()
        });
    }

    /// Run [`purge_idle`](Self::purge_idle) at most once per window.
    /// Returns whether a purge ran.
    pub fn purge_idle_if_due(&self) -> bool {
        let now = Instant::now();
        let Ok(mut last) = self.last_purge.try_lock() else {
            return false;
        };
        if now.duration_since(*last) < self.window {
            return false;
        }
        *last = now;
        drop(last);
        self.purge_idle();
        true
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}
