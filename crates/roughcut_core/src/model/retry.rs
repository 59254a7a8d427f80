//! Retry policy and response classification.

use std::time::Duration;

/// Stderr fragments that mark a capacity or rate-limit failure.
pub const TRANSIENT_SIGNATURES: &[&str] = &[
    "status 429",
    "code\": 429",
    "Too Many Requests",
    "No capacity",
    "Retrying with backoff",
];

/// Replies (lowercased) of a client that ignored the prompt and greeted
/// instead.
pub const BOOTSTRAP_MARKERS: &[&str] = &[
    "ready for your first command",
    "please provide your first command",
    "waiting for your command",
    "what can i do for you",
    "what would you like me to do",
    "i am ready for your first command",
    "i'm ready for your first command",
    "ready for your next command",
    "我已准备好",
    "请给出你的第一个指令",
];

pub fn is_transient(stderr: &str) -> bool {
    TRANSIENT_SIGNATURES.iter().any(|s| stderr.contains(s))
}

pub fn is_bootstrap_reply(response: &str) -> bool {
    let response = response.trim().to_lowercase();
    BOOTSTRAP_MARKERS.iter().any(|m| response.contains(m))
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(5),
            multiplier: 3,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let mut delay = self.initial_backoff.min(self.max_backoff);
        for _ in 1..retry {
            delay = delay
                .saturating_mul(self.multiplier.max(1))
                .min(self.max_backoff);
        }
        delay
    }
}
