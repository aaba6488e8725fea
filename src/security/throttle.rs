//! Fixed-window request throttle.
//!
//! Each key gets a counter and a reset instant. The first request after the
//! reset instant starts a new window at zero. Windows are fixed, not sliding,
//! so a client can land up to twice the nominal rate across a boundary.
//!
//! The counter is never capped: requests past the limit keep incrementing it
//! and only the returned `allowed` flag changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{ThrottleConfig, ThrottlePolicyConfig};

/// Window length and request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub window: Duration,
    pub max_requests: u32,
}

impl From<&ThrottlePolicyConfig> for ThrottlePolicy {
    fn from(config: &ThrottlePolicyConfig) -> Self {
        Self {
            window: config.window(),
            max_requests: config.max_requests,
        }
    }
}

/// Result of a single `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl ThrottleDecision {
    /// Time left until the window resets, as seen from `now`.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}

/// Counter state of one window after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u64,
    pub reset_at: Instant,
}

/// Backing store for throttle counters.
///
/// `increment` must be an atomic read-modify-write per key. The in-memory
/// store is process-local; a shared store with atomic increment and expiry
/// can stand in for it without touching callers.
pub trait ThrottleStore: Send + Sync {
    fn increment(&self, key: &str, window: Duration, now: Instant) -> WindowCount;

    /// Number of keys currently tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct ThrottleEntry {
    count: u64,
    reset_at: Instant,
}

/// Process-local store. Expired windows are swept on every access.
#[derive(Debug, Default)]
pub struct InMemoryThrottleStore {
    entries: Mutex<HashMap<String, ThrottleEntry>>,
}

impl InMemoryThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThrottleStore for InMemoryThrottleStore {
    fn increment(&self, key: &str, window: Duration, now: Instant) -> WindowCount {
        let mut entries = self.entries.lock().expect("throttle store mutex poisoned");

        entries.retain(|_, entry| entry.reset_at >= now);

        let entry = entries.entry(key.to_string()).or_insert_with(|| ThrottleEntry {
            count: 0,
            reset_at: now + window,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        entry.count = entry.count.saturating_add(1);

        WindowCount {
            count: entry.count,
            reset_at: entry.reset_at,
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().expect("throttle store mutex poisoned").len()
    }
}

/// Keyed request throttle.
#[derive(Clone)]
pub struct RequestThrottle {
    store: Arc<dyn ThrottleStore>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryThrottleStore::new()))
    }
}

impl RequestThrottle {
    pub fn new(store: Arc<dyn ThrottleStore>) -> Self {
        Self { store }
    }

    /// Count a request for `key` and decide whether it fits the policy.
    pub fn check(&self, key: &str, policy: &ThrottlePolicy) -> ThrottleDecision {
        self.check_at(key, policy, Instant::now())
    }

    pub fn check_at(&self, key: &str, policy: &ThrottlePolicy, now: Instant) -> ThrottleDecision {
        let WindowCount { count, reset_at } = self.store.increment(key, policy.window, now);
        let limit = u64::from(policy.max_requests);

        ThrottleDecision {
            allowed: count <= limit,
            limit: policy.max_requests,
            remaining: limit.saturating_sub(count) as u32,
            reset_at,
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

/// Endpoint categories with their own budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleScope {
    Login,
    Upload,
    Api,
}

impl ThrottleScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ThrottleScope::Login => "login",
            ThrottleScope::Upload => "upload",
            ThrottleScope::Api => "api",
        }
    }

    /// Store key for a client in this scope, e.g. `login:203.0.113.7`.
    pub fn key(self, client: &str) -> String {
        format!("{}:{}", self.as_str(), client)
    }

    pub fn policy(self, config: &ThrottleConfig) -> ThrottlePolicy {
        match self {
            ThrottleScope::Login => ThrottlePolicy::from(&config.login),
            ThrottleScope::Upload => ThrottlePolicy::from(&config.upload),
            ThrottleScope::Api => ThrottlePolicy::from(&config.api),
        }
    }

    /// Client-facing message when the budget is spent.
    pub fn rejection_message(self) -> &'static str {
        match self {
            ThrottleScope::Login => "Too many login attempts. Please try again later.",
            ThrottleScope::Upload => "Too many uploads. Please try again later.",
            ThrottleScope::Api => "Too many requests. Please try again later.",
        }
    }
}
