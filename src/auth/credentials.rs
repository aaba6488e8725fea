//! Admin credential verification.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// The single admin account. Only SHA-256 digests are kept in memory.
pub struct AdminCredentials {
    username: String,
    username_digest: [u8; 32],
    password_digest: [u8; 32],
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        let username = username.into();
        Self {
            username_digest: digest(&username),
            password_digest: digest(password),
            username,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.username.clone(), &config.password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Constant-time check. A missing username checks the password alone.
    pub fn verify(&self, username: Option<&str>, password: &str) -> bool {
        let password_ok: bool = digest(password).ct_eq(&self.password_digest).into();
        let username_ok: bool = match username {
            Some(username) => digest(username).ct_eq(&self.username_digest).into(),
            None => true,
        };
        password_ok & username_ok
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let creds = AdminCredentials::new("admin", "s3cret-passphrase");

        assert!(creds.verify(Some("admin"), "s3cret-passphrase"));
        assert!(creds.verify(None, "s3cret-passphrase"));
        assert!(!creds.verify(Some("admin"), "wrong-passphrase"));
        assert!(!creds.verify(Some("editor"), "s3cret-passphrase"));
        assert!(!creds.verify(None, ""));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = AdminCredentials::new("admin", "s3cret-passphrase");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("s3cret"));
    }
}
