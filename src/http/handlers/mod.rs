//! Route handlers.

pub mod auth;
pub mod health;
pub mod media;
pub mod upload;
