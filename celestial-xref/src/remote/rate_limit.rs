//! Request pacing for the remote catalog services.
//!
//! Every request is followed by a short pause, and every `big_delay_every`-th
//! request by a long one. The limiter is owned by a client instance, so
//! separate clients pace independently.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Pause after each request, in milliseconds.
    pub small_delay_ms: u64,
    /// Pause after every `big_delay_every` requests, in seconds.
    pub big_delay_secs: u64,
    /// Interval of the long pause. Zero disables it.
    pub big_delay_every: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            small_delay_ms: 300,
            big_delay_secs: 30,
            big_delay_every: 50,
        }
    }
}

impl RateLimitConfig {
    /// No pauses at all. For tests and local mirrors.
    pub fn unlimited() -> Self {
        Self {
            small_delay_ms: 0,
            big_delay_secs: 0,
            big_delay_every: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: u64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: 0,
        }
    }

    /// Counts one request and returns the pause it earns.
    pub fn next_delay(&mut self) -> Duration {
        self.requests += 1;
        let every = u64::from(self.config.big_delay_every);
        if every > 0 && self.requests % every == 0 {
            Duration::from_secs(self.config.big_delay_secs)
        } else {
            Duration::from_millis(self.config.small_delay_ms)
        }
    }

    /// Counts one request and sleeps for its pause.
    pub fn pause(&mut self) {
        let delay = self.next_delay();
        if delay >= Duration::from_secs(1) {
            info!(
                requests = self.requests,
                "pausing {} s to respect remote rate limits",
                delay.as_secs()
            );
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    /// Requests counted so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
