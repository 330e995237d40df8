//! Rate limiter implementation
//!
//! Sliding window limiting of requests per client key (the peer IP).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

/// Rate limit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Window length in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Requests allowed per client within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_window_seconds() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_seconds: default_window_seconds(),
            max_requests: default_max_requests(),
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Total limit for the window
    pub limit: u32,
    /// Time until the oldest request leaves the window (in seconds)
    pub reset_in_seconds: u64,
}

/// Per-client sliding window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    records: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: u32,
    cleanup_interval: Duration,
    last_cleanup: Arc<RwLock<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            window,
            max_requests,
            cleanup_interval: Duration::from_secs(300),
            last_cleanup: Arc::new(RwLock::new(Instant::now())),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_secs(config.window_seconds), config.max_requests)
    }

    /// Check the limit for a key and count the request if it is allowed
    pub async fn check_and_record(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();
        self.maybe_cleanup(now).await;
        self.check_and_record_at(key, now).await
    }

    async fn check_and_record_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let mut records = self.records.write().await;
        let window_start = now.checked_sub(self.window);
        let timestamps = records.entry(key.to_string()).or_default();

        while let Some(oldest) = timestamps.front() {
            match window_start {
                Some(start) if *oldest <= start => {
                    timestamps.pop_front();
                }
                _ => break,
            }
        }

        let count = timestamps.len() as u32;

        if count >= self.max_requests {
            let reset_in_seconds = timestamps
                .front()
                .map(|oldest| {
                    self.window
                        .saturating_sub(now.duration_since(*oldest))
                        .as_secs()
                })
                .unwrap_or(self.window.as_secs());

            return RateLimitResult {
                allowed: false,
                remaining: 0,
                limit: self.max_requests,
                reset_in_seconds,
            };
        }

        timestamps.push_back(now);

        RateLimitResult {
            allowed: true,
            remaining: self.max_requests - count - 1,
            limit: self.max_requests,
            reset_in_seconds: self.window.as_secs(),
        }
    }

    /// Drop keys whose requests have all left the window
    async fn maybe_cleanup(&self, now: Instant) {
        {
            let last = self.last_cleanup.read().await;
            if now.duration_since(*last) < self.cleanup_interval {
                return;
            }
        }

        *self.last_cleanup.write().await = now;

        let Some(window_start) = now.checked_sub(self.window) else {
            return;
        };

        let mut records = self.records.write().await;
        records.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|latest| *latest > window_start)
        });
    }

    /// Number of tracked client keys
    pub async fn tracked_keys(&self) -> usize {
        self.records.read().await.len()
    }
}
