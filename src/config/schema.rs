//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the studio
//! server. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the studio server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StudioConfig {
    /// Listener configuration (bind address, proxy trust).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static site settings.
    pub site: SiteConfig,

    /// Admin credentials.
    pub auth: AuthConfig,

    /// Admin session cookie settings.
    pub session: SessionConfig,

    /// Login lockout settings.
    pub lockout: LockoutConfig,

    /// Request throttling policies.
    pub throttle: ThrottleConfig,

    /// Upload storage and validation.
    pub uploads: UploadConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites these headers.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Static site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding the pre-built public site.
    pub public_dir: String,

    /// Admin login page; every other `/admin` page needs a session.
    pub admin_login_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            admin_login_path: "/admin/login".to_string(),
        }
    }
}

/// Placeholder password shipped in the defaults. Startup warns while it is in use.
pub const DEFAULT_ADMIN_PASSWORD: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Admin username.
    pub username: String,

    /// Admin password. Overridden by `STUDIO_ADMIN_PASSWORD`.
    pub password: String,

    /// Accept `{password}` bodies without a username.
    pub allow_password_only: bool,
}

impl AuthConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            allow_password_only: false,
        }
    }
}

/// Admin session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name.
    pub cookie_name: String,

    /// Session lifetime in seconds.
    pub ttl_secs: u64,

    /// Mark the cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "admin_session".to_string(),
            ttl_secs: 24 * 60 * 60,
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Brute-force lockout configuration for the login endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Enable lockout tracking.
    pub enabled: bool,

    /// Failed attempts before the client is locked out.
    pub max_attempts: u32,

    /// Lockout duration in seconds, counted from the last failure.
    pub lockout_secs: u64,

    /// Failures older than this (seconds) are forgotten.
    pub window_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            lockout_secs: 15 * 60,
            window_secs: 15 * 60,
        }
    }
}

/// A single fixed-window throttle policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct ThrottlePolicyConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests accepted per window.
    pub max_requests: u32,
}

impl ThrottlePolicyConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Request throttling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Enable throttling.
    pub enabled: bool,

    /// Login attempts per client.
    pub login: ThrottlePolicyConfig,

    /// Uploads per client.
    pub upload: ThrottlePolicyConfig,

    /// Any `/api` request per client.
    pub api: ThrottlePolicyConfig,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login: ThrottlePolicyConfig {
                window_secs: 15 * 60,
                max_requests: 5,
            },
            upload: ThrottlePolicyConfig {
                window_secs: 60 * 60,
                max_requests: 10,
            },
            api: ThrottlePolicyConfig {
                window_secs: 15 * 60,
                max_requests: 100,
            },
        }
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory uploads are written to. Videos go to `<dir>/videos`.
    pub dir: String,

    /// Public URL prefix of `dir`.
    pub url_prefix: String,

    /// Require an admin session to upload.
    pub require_session: bool,

    /// Maximum size of a generic upload in bytes.
    pub max_file_bytes: usize,

    /// Content types accepted by `/api/upload`.
    pub allowed_file_types: Vec<String>,

    /// Maximum size of a video upload in bytes.
    pub max_video_bytes: usize,

    /// Content types accepted by `/api/upload-video`.
    pub allowed_video_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "public/uploads".to_string(),
            url_prefix: "/uploads".to_string(),
            require_session: true,
            max_file_bytes: 10 * 1024 * 1024, // 10MB
            allowed_file_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "video/mp4",
                "video/webm",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_video_bytes: 500 * 1024 * 1024,
            allowed_video_types: [
                "video/mp4",
                "video/webm",
                "video/ogg",
                "video/avi",
                "video/mov",
                "video/quicktime",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// Content-Security-Policy header value.
    pub content_security_policy: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            content_security_policy: [
                "default-src 'self'",
                "script-src 'self' 'unsafe-inline'",
                "style-src 'self' 'unsafe-inline' https://fonts.googleapis.com",
                "font-src 'self' https://fonts.gstatic.com",
                "img-src 'self' data: https: blob:",
                "media-src 'self' https: blob:",
                "connect-src 'self' https: wss:",
                "frame-src 'none'",
                "object-src 'none'",
                "base-uri 'self'",
                "form-action 'self'",
                "frame-ancestors 'none'",
            ]
            .join("; "),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Security events kept in memory.
    pub security_log_capacity: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            security_log_capacity: 10_000,
        }
    }
}
