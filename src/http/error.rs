//! API error type and its JSON rendering.
//!
//! Every failure leaves the server as `{"success": false, "error": "..."}`
//! with the status code of its class. Internal errors are logged here and
//! answered with a generic message.

use std::time::{Duration, Instant};

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::security::ThrottleDecision;

/// Counters reported in the `X-RateLimit-*` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input data")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials { remaining_attempts: u32 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    TooManyRequests {
        message: String,
        retry_after: Duration,
        rate_limit: Option<RateLimitInfo>,
    },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Throttle refusal carrying the decision's counters.
    pub fn throttled(message: impl Into<String>, decision: &ThrottleDecision) -> Self {
        let now = Instant::now();
        let retry_after = decision.retry_after(now);
        let reset_at = Utc::now()
            + chrono::Duration::from_std(retry_after).unwrap_or_else(|_| chrono::Duration::zero());

        ApiError::TooManyRequests {
            message: message.into(),
            retry_after,
            rate_limit: Some(RateLimitInfo {
                limit: decision.limit,
                remaining: decision.remaining,
                reset_at,
            }),
        }
    }

    /// Log `err` and answer with `message` only.
    pub fn internal(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        let message = message.into();
        tracing::error!(error = %err, "{}", message);
        ApiError::Internal(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials { .. } | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whole seconds for `Retry-After`, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("error".into(), Value::String(self.to_string()));

        let mut headers = HeaderMap::new();
        match &self {
            ApiError::Validation(details) => {
                body.insert("details".into(), json!(details));
            }
            ApiError::InvalidCredentials { remaining_attempts } => {
                body.insert("remainingAttempts".into(), json!(remaining_attempts));
            }
            ApiError::TooManyRequests {
                retry_after,
                rate_limit,
                ..
            } => {
                let secs = retry_after_secs(*retry_after);
                body.insert("retryAfter".into(), json!(secs));
                headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));

                if let Some(info) = rate_limit {
                    headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
                    headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining));
                    if let Ok(reset) = HeaderValue::from_str(&info.reset_at.to_rfc3339()) {
                        headers.insert("x-ratelimit-reset", reset);
                    }
                }
            }
            _ => {}
        }

        (status, headers, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(3_599_001)), 3600);
        assert_eq!(retry_after_secs(Duration::from_secs(900)), 900);
    }

    #[tokio::test]
    async fn test_validation_body() {
        let response =
            ApiError::Validation(vec!["password: too short".into()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid input data");
        assert_eq!(body["details"][0], "password: too short");
    }

    #[tokio::test]
    async fn test_throttled_headers() {
        let decision = ThrottleDecision {
            allowed: false,
            limit: 10,
            remaining: 0,
            reset_at: Instant::now() + Duration::from_secs(3600),
        };
        let response = ApiError::throttled("Too many uploads.", &decision).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        let retry: u64 = headers[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
        assert!((3599..=3600).contains(&retry));
        assert_eq!(headers["x-ratelimit-limit"], "10");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert!(headers.contains_key("x-ratelimit-reset"));

        let body = body_json(response).await;
        assert_eq!(body["error"], "Too many uploads.");
    }

    #[tokio::test]
    async fn test_invalid_credentials_reports_remaining() {
        let response = ApiError::InvalidCredentials {
            remaining_attempts: 3,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["remainingAttempts"], 3);
    }
}
