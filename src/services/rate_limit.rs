// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Global request quota for the Dailymile API.
//!
//! Every outbound request goes through a [`RateGate`] first. One gate is
//! shared (`Arc<dyn RateGate>`) by all accounts and all adapter instances.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Blocks the caller until one more remote request is allowed.
#[async_trait]
pub trait RateGate: Send + Sync {
    async fn acquire(&self);
}

/// Gate that never waits (local tools and tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl RateGate for Unlimited {
    async fn acquire(&self) {}
}

/// At most `max_requests` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Parse `"<max>/<window seconds>"`, e.g. `"100/3600"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (max, secs) = raw
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("expected <max>/<seconds>, got '{}'", raw.trim()))?;
        let max_requests: u32 = max
            .trim()
            .parse()
            .map_err(|e| format!("bad request count '{}': {}", max.trim(), e))?;
        let secs: u64 = secs
            .trim()
            .parse()
            .map_err(|e| format!("bad window '{}': {}", secs.trim(), e))?;
        if max_requests == 0 || secs == 0 {
            return Err(format!("limit '{}' must be non-zero", raw.trim()));
        }
        Ok(Self::new(max_requests, Duration::from_secs(secs)))
    }

    /// Parse a comma-separated list of limits.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, String> {
        raw.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// In-process sliding-window limiter honoring several windows at once.
pub struct WindowedRateLimiter {
    limits: Vec<RateLimit>,
    history: Mutex<VecDeque<Instant>>,
}

impl WindowedRateLimiter {
    pub fn new(limits: Vec<RateLimit>) -> Self {
        Self {
            limits,
            history: Mutex::new(VecDeque::new()),
        }
    }

    fn longest_window(&self) -> Duration {
        self.limits
            .iter()
            .map(|l| l.window)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// How long until a request at `now` fits every limit, `None` if it fits now.
///
/// `history` holds past request instants in ascending order.
fn next_permit_delay(
    limits: &[RateLimit],
    history: &VecDeque<Instant>,
    now: Instant,
) -> Option<Duration> {
    limits
        .iter()
        .filter_map(|limit| {
            let in_window: Vec<&Instant> = history
                .iter()
                .filter(|t| now.duration_since(**t) < limit.window)
                .collect();
            let max = limit.max_requests as usize;
            if in_window.len() < max {
                return None;
            }
            // The request that has to age out before one more fits.
            let blocking = *in_window[in_window.len() - max];
            Some((blocking + limit.window).saturating_duration_since(now))
        })
        .max()
}

#[async_trait]
impl RateGate for WindowedRateLimiter {
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut history = self.history.lock().await;
                let now = Instant::now();
                let longest = self.longest_window();
                while history
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= longest)
                {
                    history.pop_front();
                }

                match next_permit_delay(&self.limits, &history, now) {
                    None => {
                        history.push_back(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
