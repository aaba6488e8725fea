//! Request middleware shared by the API routes.

pub mod throttle;

pub use throttle::{api_throttle_middleware, enforce};
