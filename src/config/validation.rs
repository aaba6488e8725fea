//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and addresses. All errors
//! are collected so a broken config file can be fixed in one pass.

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::config::schema::{StudioConfig, ThrottlePolicyConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, returning every error found.
pub fn validate_config(config: &StudioConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if !config.site.admin_login_path.starts_with("/admin") {
        errors.push(ValidationError::new(
            "site.admin_login_path",
            "must live under /admin",
        ));
    }

    if config.auth.username.trim().is_empty() {
        errors.push(ValidationError::new("auth.username", "must not be empty"));
    }
    if config.auth.password.is_empty() {
        errors.push(ValidationError::new("auth.password", "must not be empty"));
    }

    if config.session.cookie_name.is_empty() {
        errors.push(ValidationError::new("session.cookie_name", "must not be empty"));
    }
    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::new("session.ttl_secs", "must be greater than 0"));
    }

    if config.lockout.max_attempts == 0 {
        errors.push(ValidationError::new("lockout.max_attempts", "must be at least 1"));
    }
    if config.lockout.lockout_secs == 0 {
        errors.push(ValidationError::new("lockout.lockout_secs", "must be greater than 0"));
    }
    if config.lockout.window_secs == 0 {
        errors.push(ValidationError::new("lockout.window_secs", "must be greater than 0"));
    }

    check_policy("throttle.login", &config.throttle.login, &mut errors);
    check_policy("throttle.upload", &config.throttle.upload, &mut errors);
    check_policy("throttle.api", &config.throttle.api, &mut errors);

    if config.uploads.max_file_bytes == 0 {
        errors.push(ValidationError::new("uploads.max_file_bytes", "must be greater than 0"));
    }
    if config.uploads.max_video_bytes == 0 {
        errors.push(ValidationError::new("uploads.max_video_bytes", "must be greater than 0"));
    }
    if config.uploads.allowed_file_types.is_empty() {
        errors.push(ValidationError::new("uploads.allowed_file_types", "must not be empty"));
    }
    if config.uploads.allowed_video_types.is_empty() {
        errors.push(ValidationError::new("uploads.allowed_video_types", "must not be empty"));
    }
    if !config.uploads.url_prefix.starts_with('/') {
        errors.push(ValidationError::new("uploads.url_prefix", "must start with '/'"));
    }

    if config.security.enable_headers
        && HeaderValue::from_str(&config.security.content_security_policy).is_err()
    {
        errors.push(ValidationError::new(
            "security.content_security_policy",
            "is not a valid header value",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }
    if config.observability.security_log_capacity == 0 {
        errors.push(ValidationError::new(
            "observability.security_log_capacity",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_policy(field: &str, policy: &ThrottlePolicyConfig, errors: &mut Vec<ValidationError>) {
    if policy.window_secs == 0 {
        errors.push(ValidationError::new(
            format!("{field}.window_secs"),
            "must be greater than 0",
        ));
    }
    if policy.max_requests == 0 {
        errors.push(ValidationError::new(
            format!("{field}.max_requests"),
            "must be at least 1",
        ));
    }
}
