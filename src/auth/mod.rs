//! Admin authentication: credentials, login validation and sessions.

pub mod credentials;
pub mod login;
pub mod session;

pub use credentials::AdminCredentials;
pub use login::LoginRequest;
pub use session::{Session, SessionStore, SessionToken};
