//! Deployment id generation.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Generates `{prefix}-{millis}` ids whose millis never repeat.
///
/// When two ids are requested in the same millisecond, or the clock steps
/// backwards, the later id takes the previous value plus one.
#[derive(Debug, Default)]
pub struct DeploymentIdGenerator {
    last: AtomicI64,
}

impl DeploymentIdGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Returns the next id for `prefix`.
    pub fn next(&self, prefix: &str, clock: &dyn Clock) -> String {
        let now = clock.now_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        format!("{prefix}-{}", now.max(previous + 1))
    }
}
