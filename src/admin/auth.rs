//! Admin session guards.
//!
//! API routes answer 401 without a session; admin pages redirect to the
//! login page instead.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use percent_encoding::percent_decode_str;
use serde_json::json;

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::{RequestContext, SecurityEventKind};
use crate::security::ClientIp;

/// Live admin session referenced by the request's cookie.
pub fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    state
        .sessions
        .from_jar(jar, &state.config.session.cookie_name)
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    client: ClientIp,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if current_session(&state, &jar).is_some() {
        return Ok(next.run(request).await);
    }

    let context = RequestContext::new(&client, request.headers(), request.uri().path());
    state.monitor.record(
        SecurityEventKind::UnauthorizedAccess,
        "Admin API request without session",
        json!({ "method": request.method().as_str() }),
        &context,
    );
    Err(ApiError::Unauthorized)
}

/// Redirect `/admin` pages to the login page when there is no session.
pub async fn admin_page_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let login_path = state.config.site.admin_login_path.as_str();
    let path = request.uri().path();

    if is_admin_page(path, login_path) && current_session(&state, &jar).is_none() {
        tracing::debug!(path = %path, "Redirecting to admin login");
        return Redirect::temporary(login_path).into_response();
    }

    next.run(request).await
}

/// Whether `path` resolves to a file under `public/admin` other than the
/// login page. Matches on the decoded, normalized path that the static file
/// service resolves, so encoded or dotted spellings of `/admin` are caught.
fn is_admin_page(path: &str, login_path: &str) -> bool {
    let segments = normalized_segments(path);
    let is_admin = segments
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case("admin"));
    if !is_admin {
        return false;
    }

    let login = normalized_segments(login_path);
    let is_login = segments.len() >= login.len()
        && segments
            .iter()
            .zip(&login)
            .all(|(a, b)| a.eq_ignore_ascii_case(b));
    !is_login
}

/// Percent-decoded path segments without empty and `.` parts.
fn normalized_segments(path: &str) -> Vec<String> {
    percent_decode_str(path)
        .decode_utf8_lossy()
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}
