//! Admin API and page guards.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::{get_security_report, get_status};

/// Session-protected admin API, mounted under `/api/admin`.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/status", get(get_status))
        .route("/api/admin/security", get(get_security_report))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
