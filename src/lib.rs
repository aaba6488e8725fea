//! Studio admin server library.
//!
//! Serves a static site, a password-protected admin area and a small JSON
//! API for media uploads, guarded by per-client throttles and a login
//! lockout.

pub mod admin;
pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod media;
pub mod observability;
pub mod security;

pub use config::StudioConfig;
pub use http::StudioServer;
pub use lifecycle::Shutdown;
