//! Login lockout tracking.
//!
//! # State Transitions
//! ```text
//! UNTRACKED → FAILING: first failed attempt
//! FAILING → LOCKED: failures >= max_attempts (locked for `lockout` from the last failure)
//! FAILING → UNTRACKED: success, or no failure within `window`
//! LOCKED → UNTRACKED: success, or lock expiry when next observed
//! ```
//!
//! State lives in process memory; a restart unlocks every client.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::LockoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
    pub window: Duration,
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(config: &LockoutConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            lockout: Duration::from_secs(config.lockout_secs),
            window: Duration::from_secs(config.window_secs),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LockoutEntry {
    failures: u32,
    last_attempt: Instant,
    locked_until: Option<Instant>,
}

/// Per-key failed login counter with timed lockout.
#[derive(Debug)]
pub struct LockoutTracker {
    entries: Mutex<HashMap<String, LockoutEntry>>,
    policy: LockoutPolicy,
}

impl LockoutTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// True while `key` has an unexpired lock.
    pub fn is_blocked(&self, key: &str) -> bool {
        self.is_blocked_at(key, Instant::now())
    }

    pub fn is_blocked_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().expect("lockout mutex poisoned");

        let Some(entry) = entries.get(key) else {
            return false;
        };

        if self.is_stale(entry, now) {
            entries.remove(key);
            return false;
        }

        entry.locked_until.is_some()
    }

    /// Success forgets the key; failure counts towards a lockout.
    pub fn record_attempt(&self, key: &str, success: bool) {
        self.record_attempt_at(key, success, Instant::now());
    }

    pub fn record_attempt_at(&self, key: &str, success: bool, now: Instant) {
        let mut entries = self.entries.lock().expect("lockout mutex poisoned");

        if success {
            entries.remove(key);
            return;
        }

        let fresh = LockoutEntry {
            failures: 0,
            last_attempt: now,
            locked_until: None,
        };
        let entry = entries.entry(key.to_string()).or_insert(fresh);
        if self.is_stale(entry, now) {
            *entry = fresh;
        }

        entry.failures = entry.failures.saturating_add(1);
        entry.last_attempt = now;

        if entry.failures >= self.policy.max_attempts {
            entry.locked_until = Some(now + self.policy.lockout);
            tracing::warn!(
                client = %key,
                failures = entry.failures,
                lockout_secs = self.policy.lockout.as_secs(),
                "Login lockout triggered"
            );
        }
    }

    /// Failures left before lockout, floored at zero.
    pub fn remaining_attempts(&self, key: &str) -> u32 {
        self.remaining_attempts_at(key, Instant::now())
    }

    pub fn remaining_attempts_at(&self, key: &str, now: Instant) -> u32 {
        let entries = self.entries.lock().expect("lockout mutex poisoned");
        match entries.get(key) {
            Some(entry) if !self.is_stale(entry, now) => {
                self.policy.max_attempts.saturating_sub(entry.failures)
            }
            _ => self.policy.max_attempts,
        }
    }

    /// Time until the lock on `key` lifts, if it is locked.
    pub fn lockout_time_remaining(&self, key: &str) -> Option<Duration> {
        self.lockout_time_remaining_at(key, Instant::now())
    }

    pub fn lockout_time_remaining_at(&self, key: &str, now: Instant) -> Option<Duration> {
        let entries = self.entries.lock().expect("lockout mutex poisoned");
        entries
            .get(key)
            .filter(|entry| !self.is_stale(entry, now))
            .and_then(|entry| entry.locked_until)
            .map(|until| until - now)
    }

    /// Drop every entry that no longer affects any decision.
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("lockout mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !self.is_stale(entry, now));
        before - entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().expect("lockout mutex poisoned").len()
    }

    fn is_stale(&self, entry: &LockoutEntry, now: Instant) -> bool {
        match entry.locked_until {
            Some(until) => now >= until,
            None => now.saturating_duration_since(entry.last_attempt) > self.policy.window,
        }
    }
}
