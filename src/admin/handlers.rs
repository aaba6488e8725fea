use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::observability::{SecurityEvent, SecurityMetrics};

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub throttle_keys: usize,
    pub lockout_keys: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    pub success: bool,
    pub metrics: SecurityMetrics,
    pub anomalies: Vec<String>,
    pub recent_events: Vec<SecurityEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub limit: Option<usize>,
}

/// `GET /api/admin/status`
pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
        throttle_keys: state.throttle.tracked_keys(),
        lockout_keys: state.lockout.tracked_keys(),
    })
}

/// `GET /api/admin/security`
pub async fn get_security_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Json<SecurityReport> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    let metrics = state.monitor.metrics();

    Json(SecurityReport {
        success: true,
        anomalies: crate::observability::monitor::anomalies_for(&metrics),
        metrics,
        recent_events: state.monitor.recent(limit),
    })
}
