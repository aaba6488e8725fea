//! Throttle enforcement.
//!
//! `enforce` is called by handlers with their own scope (login, upload);
//! `api_throttle_middleware` covers the remaining API routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::{metrics, RequestContext, SecurityEventKind};
use crate::security::{ClientIp, ThrottleScope, UNKNOWN_CLIENT};

/// Count the request against `scope` for the client in `context`.
pub fn enforce(
    state: &AppState,
    scope: ThrottleScope,
    context: &RequestContext,
) -> Result<(), ApiError> {
    if !state.config.throttle.enabled {
        return Ok(());
    }

    let client = context.ip.as_deref().unwrap_or(UNKNOWN_CLIENT);
    let key = scope.key(client);
    let policy = scope.policy(&state.config.throttle);
    let decision = state.throttle.check(&key, &policy);

    if decision.allowed {
        return Ok(());
    }

    tracing::warn!(
        key = %key,
        limit = decision.limit,
        window_secs = policy.window.as_secs(),
        "Throttle limit exceeded"
    );
    metrics::record_throttle_rejected(scope.as_str());
    state.monitor.record(
        SecurityEventKind::RateLimitExceeded,
        format!("Rate limit exceeded for {}", scope.as_str()),
        json!({ "key": key, "limit": decision.limit }),
        context,
    );

    Err(ApiError::throttled(scope.rejection_message(), &decision))
}

pub async fn api_throttle_middleware(
    State(state): State<AppState>,
    client: ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = RequestContext::new(&client, request.headers(), request.uri().path());
    enforce(&state, ThrottleScope::Api, &context)?;
    Ok(next.run(request).await)
}
