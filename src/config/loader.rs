//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::StudioConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `auth.username`.
pub const ENV_ADMIN_USERNAME: &str = "STUDIO_ADMIN_USERNAME";
/// Environment variable overriding `auth.password`.
pub const ENV_ADMIN_PASSWORD: &str = "STUDIO_ADMIN_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StudioConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: StudioConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<StudioConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = StudioConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Parse and validate configuration from a TOML string. No env overrides.
pub fn parse_config(content: &str) -> Result<StudioConfig, ConfigError> {
    let config: StudioConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Secrets may come from the environment instead of the config file.
pub fn apply_env_overrides<F>(config: &mut StudioConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(username) = lookup(ENV_ADMIN_USERNAME).filter(|v| !v.is_empty()) {
        config.auth.username = username;
    }
    if let Some(password) = lookup(ENV_ADMIN_PASSWORD).filter(|v| !v.is_empty()) {
        config.auth.password = password;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [throttle.upload]
            window_secs = 60
            max_requests = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.throttle.upload.max_requests, 3);
        assert_eq!(config.throttle.login.max_requests, 5);
        assert_eq!(config.session.cookie_name, "admin_session");
        assert_eq!(config.lockout.max_attempts, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config(
            r#"
            [lockout]
            max_attempts = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors[0].field, "lockout.max_attempts");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        assert!(matches!(
            parse_config("[listener\nbind_address ="),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = StudioConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_ADMIN_PASSWORD => Some("from-the-env".to_string()),
            ENV_ADMIN_USERNAME => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.auth.password, "from-the-env");
        assert_eq!(config.auth.username, "admin");
    }
}
