//! Login, logout and session probe.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, Uri},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use crate::auth::session::{removal_cookie, session_cookie};
use crate::auth::LoginRequest;
use crate::http::error::ApiError;
use crate::http::middleware::enforce;
use crate::http::server::AppState;
use crate::observability::{metrics, RequestContext, SecurityEventKind};
use crate::security::{ClientIp, ThrottleScope};

/// `POST /api/auth/login`
///
/// Checks run in this order: lockout, login throttle, body validation,
/// credentials. A locked-out client never reaches the credential check.
pub async fn login(
    State(state): State<AppState>,
    client: ClientIp,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let context = RequestContext::new(&client, &headers, uri.path());
    let lockout_key = client.as_str();
    let lockout_enabled = state.config.lockout.enabled;

    if lockout_enabled && state.lockout.is_blocked(lockout_key) {
        let remaining = state
            .lockout
            .lockout_time_remaining(lockout_key)
            .unwrap_or_default();
        let minutes = remaining.as_secs().div_ceil(60).max(1);

        state.monitor.record(
            SecurityEventKind::BruteForceAttempt,
            "Login attempt while locked out",
            json!({ "remainingSecs": remaining.as_secs() }),
            &context,
        );
        return Err(ApiError::TooManyRequests {
            message: format!("Account temporarily locked. Try again in {minutes} minutes."),
            retry_after: remaining,
            rate_limit: None,
        });
    }

    enforce(&state, ThrottleScope::Login, &context)?;

    let Json(request) = payload.map_err(|rejection| {
        let detail = rejection.body_text();
        state.monitor.record(
            SecurityEventKind::InvalidInput,
            "Malformed login body",
            json!({ "error": detail }),
            &context,
        );
        ApiError::Validation(vec![detail])
    })?;

    if let Err(details) = request.validate(state.config.auth.allow_password_only) {
        state.monitor.record(
            SecurityEventKind::InvalidInput,
            "Login body failed validation",
            json!({ "errors": details }),
            &context,
        );
        return Err(ApiError::Validation(details));
    }

    if state
        .credentials
        .verify(request.username.as_deref(), &request.password)
    {
        state.lockout.record_attempt(lockout_key, true);

        let (token, session) = state.sessions.create(state.credentials.username());
        metrics::record_login_attempt("success");
        metrics::record_active_sessions(state.sessions.len());
        state.monitor.record(
            SecurityEventKind::LoginSuccess,
            "Admin logged in",
            json!({ "username": session.username }),
            &context,
        );

        let jar = jar.add(session_cookie(&state.config.session, &token));
        return Ok((jar, Json(json!({ "success": true }))));
    }

    if lockout_enabled {
        state.lockout.record_attempt(lockout_key, false);
        if state.lockout.is_blocked(lockout_key) {
            metrics::record_lockout();
        }
    }
    let remaining_attempts = state.lockout.remaining_attempts(lockout_key);

    metrics::record_login_attempt("failure");
    state.monitor.record(
        SecurityEventKind::LoginFailed,
        "Invalid admin credentials",
        json!({
            "username": request.username,
            "remainingAttempts": remaining_attempts,
        }),
        &context,
    );

    Err(ApiError::InvalidCredentials { remaining_attempts })
}

/// `POST /api/auth/logout`
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let config = &state.config.session;
    if let Some(cookie) = jar.get(&config.cookie_name) {
        if state.sessions.revoke(cookie.value()) {
            tracing::info!("Admin session revoked");
        }
    }
    metrics::record_active_sessions(state.sessions.len());

    (jar.remove(removal_cookie(config)), Json(json!({ "success": true })))
}

/// `GET /api/auth/session`
pub async fn session(State(state): State<AppState>, jar: CookieJar) -> Json<Value> {
    match state
        .sessions
        .from_jar(&jar, &state.config.session.cookie_name)
    {
        Some(session) => Json(json!({
            "authenticated": true,
            "username": session.username,
            "expiresAt": session.expires_at,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
