//! In-memory security event log.
//!
//! Keeps the most recent `capacity` events for the admin security report and
//! mirrors each one to `tracing` and the metrics counters.

use std::collections::VecDeque;
use std::sync::Mutex;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::observability::metrics;
use crate::security::ClientIp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    LoginSuccess,
    LoginFailed,
    BruteForceAttempt,
    RateLimitExceeded,
    UnauthorizedAccess,
    FileUpload,
    InvalidInput,
    SuspiciousActivity,
}

impl SecurityEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEventKind::LoginSuccess => "LOGIN_SUCCESS",
            SecurityEventKind::LoginFailed => "LOGIN_FAILED",
            SecurityEventKind::BruteForceAttempt => "BRUTE_FORCE_ATTEMPT",
            SecurityEventKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            SecurityEventKind::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            SecurityEventKind::FileUpload => "FILE_UPLOAD",
            SecurityEventKind::InvalidInput => "INVALID_INPUT",
            SecurityEventKind::SuspiciousActivity => "SUSPICIOUS_ACTIVITY",
        }
    }

    pub fn level(self) -> EventLevel {
        match self {
            SecurityEventKind::LoginSuccess => EventLevel::Info,
            SecurityEventKind::LoginFailed | SecurityEventKind::RateLimitExceeded => EventLevel::Warn,
            SecurityEventKind::BruteForceAttempt
            | SecurityEventKind::UnauthorizedAccess
            | SecurityEventKind::SuspiciousActivity => EventLevel::Security,
            _ => EventLevel::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Security,
}

/// Who made the request an event is about.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub path: Option<String>,
}

impl RequestContext {
    pub fn new(client: &ClientIp, headers: &HeaderMap, path: &str) -> Self {
        Self {
            ip: Some(client.to_string()),
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            path: Some(path.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    #[serde(rename = "event")]
    pub kind: SecurityEventKind,
    pub message: String,
    pub details: Value,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub path: Option<String>,
}

/// Counts over the trailing 24 hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMetrics {
    pub total_logins: usize,
    pub failed_logins: usize,
    pub brute_force_attempts: usize,
    pub rate_limit_hits: usize,
    pub suspicious_activity: usize,
}

pub struct SecurityMonitor {
    events: Mutex<VecDeque<SecurityEvent>>,
    capacity: usize,
}

impl SecurityMonitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(
        &self,
        kind: SecurityEventKind,
        message: impl Into<String>,
        details: Value,
        context: &RequestContext,
    ) {
        self.record_at(kind, message, details, context, Utc::now());
    }

    pub fn record_at(
        &self,
        kind: SecurityEventKind,
        message: impl Into<String>,
        details: Value,
        context: &RequestContext,
        timestamp: DateTime<Utc>,
    ) {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            timestamp,
            level: kind.level(),
            kind,
            message: message.into(),
            details,
            ip: context.ip.clone(),
            user_agent: context.user_agent.clone(),
            path: context.path.clone(),
        };

        emit(&event);
        metrics::record_security_event(kind.as_str());

        let mut events = self.events.lock().expect("security monitor mutex poisoned");
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("security monitor mutex poisoned");
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn metrics(&self) -> SecurityMetrics {
        self.metrics_at(Utc::now())
    }

    pub fn metrics_at(&self, now: DateTime<Utc>) -> SecurityMetrics {
        let cutoff = now - Duration::hours(24);
        let events = self.events.lock().expect("security monitor mutex poisoned");

        let mut metrics = SecurityMetrics::default();
        for event in events.iter().filter(|e| e.timestamp >= cutoff) {
            match event.kind {
                SecurityEventKind::LoginSuccess => metrics.total_logins += 1,
                SecurityEventKind::LoginFailed => metrics.failed_logins += 1,
                SecurityEventKind::BruteForceAttempt => metrics.brute_force_attempts += 1,
                SecurityEventKind::RateLimitExceeded => metrics.rate_limit_hits += 1,
                SecurityEventKind::SuspiciousActivity => metrics.suspicious_activity += 1,
                _ => {}
            }
        }
        metrics
    }
}

/// Alert messages for counts above their thresholds.
pub fn anomalies_for(metrics: &SecurityMetrics) -> Vec<String> {
    let mut anomalies = Vec::new();
    if metrics.failed_logins > 10 {
        anomalies.push("High failed login rate detected".to_string());
    }
    if metrics.brute_force_attempts > 5 {
        anomalies.push("Brute force attempts detected".to_string());
    }
    if metrics.rate_limit_hits > 50 {
        anomalies.push("High rate limit hits detected".to_string());
    }
    if metrics.suspicious_activity > 3 {
        anomalies.push("Suspicious activity detected".to_string());
    }
    anomalies
}

fn emit(event: &SecurityEvent) {
    let ip = event.ip.as_deref().unwrap_or("-");
    let path = event.path.as_deref().unwrap_or("-");
    match event.level {
        EventLevel::Info => tracing::info!(
            target: "studio_server::security",
            event = event.kind.as_str(), ip, path, details = %event.details, "{}", event.message
        ),
        EventLevel::Warn | EventLevel::Security => tracing::warn!(
            target: "studio_server::security",
            event = event.kind.as_str(), ip, path, details = %event.details, "{}", event.message
        ),
    }
}
