//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (attribute the request to a client key)
//!     → throttle.rs (fixed-window budget per scope and client)
//!     → lockout.rs (login only: refuse locked-out clients)
//!     → handler
//! Outgoing response:
//!     → headers.rs (hardening headers, CSP)
//! ```
//!
//! # Design Decisions
//! - Stores are explicit objects owned by `AppState`, never globals
//! - Refusals are immediate: no queueing, no partial success
//! - State is process-local and lost on restart

pub mod client_ip;
pub mod headers;
pub mod lockout;
pub mod throttle;

pub use client_ip::{ClientIp, UNKNOWN_CLIENT};
pub use lockout::{LockoutPolicy, LockoutTracker};
pub use throttle::{
    InMemoryThrottleStore, RequestThrottle, ThrottleDecision, ThrottlePolicy, ThrottleScope,
    ThrottleStore,
};
