//! Timing attack protection utilities
//!
//! Credential checks must not reveal, through response time, whether the
//! account existed or which part of the credential was wrong.

use std::time::{Duration, Instant};

/// Constant-time string comparison to prevent timing attacks.
/// Only the length short-circuits; digests of one hasher always share a length.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    constant_time_eq_bytes(a.as_bytes(), b.as_bytes())
}

/// Constant-time byte array comparison
pub fn constant_time_eq_bytes(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

/// Pads failed authentications up to a minimum duration
pub struct AuthTimer {
    start: Instant,
    min_duration: Duration,
}

impl AuthTimer {
    /// Start timing an authentication attempt
    pub fn new(min_duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            min_duration,
        }
    }

    /// Wait until minimum duration has elapsed
    pub async fn wait(self) {
        let elapsed = self.start.elapsed();
        if elapsed < self.min_duration {
            tokio::time::sleep(self.min_duration - elapsed).await;
        }
    }
}
