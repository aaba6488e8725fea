//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout, security headers)
//!     → admin page guard (redirect /admin/* without a session)
//!     → middleware/throttle.rs (API budget) or handler-level login/upload budgets
//!     → handlers/* (JSON API) or the static site in public/
//!     → error.rs (ApiError → JSON body + status)
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, StudioServer};
