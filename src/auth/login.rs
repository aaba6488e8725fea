//! Login request body and its validation rules.

use serde::Deserialize;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

/// `POST /api/auth/login` body. Older clients send only `password`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Returns every rule the request breaks, as `field: message` strings.
    pub fn validate(&self, allow_password_only: bool) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.username.as_deref() {
            Some(username) => {
                let len = username.chars().count();
                if len < USERNAME_MIN {
                    errors.push(format!(
                        "username: Username must be at least {USERNAME_MIN} characters"
                    ));
                } else if len > USERNAME_MAX {
                    errors.push(format!(
                        "username: Username must be less than {USERNAME_MAX} characters"
                    ));
                }
                if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    errors.push(
                        "username: Username can only contain letters, numbers, and underscores"
                            .to_string(),
                    );
                }
            }
            None if !allow_password_only => {
                errors.push("username: Username is required".to_string());
            }
            None => {}
        }

        let len = self.password.chars().count();
        if len < PASSWORD_MIN {
            errors.push(format!(
                "password: Password must be at least {PASSWORD_MIN} characters"
            ));
        } else if len > PASSWORD_MAX {
            errors.push(format!(
                "password: Password must be less than {PASSWORD_MAX} characters"
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
