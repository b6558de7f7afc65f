//! Per-key rate limiting for error notifications
//!
//! Each `source|severity` key gets a notified-count and the instant of its
//! last notification. A key is silenced once it reaches the threshold, and
//! is held back while inside the cooldown window. Suppressed occurrences do
//! not touch the state, so the cooldown is measured from the last
//! *notified* occurrence.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::context::{ErrorContext, ErrorSource, Severity, SuppressionKey};

pub const DEFAULT_MAX_BEFORE_SILENT: u32 = 3;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Bookkeeping for one suppression key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionState {
    pub count: u32,
    pub last_occurrence: Instant,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Threshold reached; stays silent until reset
    Silenced,
    /// Too soon after the previous notification; expires on its own
    CoolingDown { remaining: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    max_before_silent: u32,
    cooldown: Duration,
    states: HashMap<SuppressionKey, SuppressionState>,
}

impl RateLimiter {
    pub fn new(max_before_silent: u32, cooldown: Duration) -> Self {
        Self {
            max_before_silent,
            cooldown,
            states: HashMap::new(),
        }
    }

    /// Decide whether `context` should be surfaced at `now`, recording it
    /// when allowed.
    pub fn check(&mut self, context: &ErrorContext, now: Instant) -> Decision {
        let key = context.key();

        if let Some(state) = self.states.get(&key) {
            if state.count >= self.max_before_silent {
                return Decision::Silenced;
            }
            let elapsed = now.saturating_duration_since(state.last_occurrence);
            if elapsed < self.cooldown {
                return Decision::CoolingDown {
                    remaining: self.cooldown - elapsed,
                };
            }
        } else if self.max_before_silent == 0 {
            return Decision::Silenced;
        }

        let state = self.states.entry(key).or_insert(SuppressionState {
            count: 0,
            last_occurrence: now,
        });
        state.count += 1;
        state.last_occurrence = now;
        Decision::Allow
    }

    pub fn should_notify(&mut self, context: &ErrorContext, now: Instant) -> bool {
        self.check(context, now).is_allowed()
    }

    /// True once the key has hit the threshold, regardless of cooldown
    pub fn is_suppressed(&self, source: ErrorSource, severity: Severity) -> bool {
        self.count(source, severity) >= self.max_before_silent
    }

    pub fn count(&self, source: ErrorSource, severity: Severity) -> u32 {
        self.states
            .get(&SuppressionKey::new(source, severity))
            .map(|state| state.count)
            .unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Number of keys with at least one notified occurrence
    pub fn tracked_keys(&self) -> usize {
        self.states.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BEFORE_SILENT, DEFAULT_COOLDOWN)
    }
}
