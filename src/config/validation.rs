//! Configuration validation.
//!
//! Returns every problem found rather than stopping at the first, so an
//! operator can fix a config file in one pass.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::VaultConfig;
use crate::crypto::EncryptionKey;

/// Longest accepted rate-limit window (one week).
const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check value ranges and cross-field rules.
pub fn validate_config(config: &VaultConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() || tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are both required",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if let Some(key) = &config.encryption.key_hex {
        if let Err(e) = EncryptionKey::from_hex(key) {
            errors.push(ValidationError::new("encryption.key_hex", e.to_string()));
        }
    } else if config.encryption.key_env.trim().is_empty() {
        errors.push(ValidationError::new(
            "encryption.key_env",
            "must name a variable when key_hex is unset",
        ));
    }

    let rl = &config.rate_limit;
    if rl.enabled {
        if rl.max_attempts == 0 {
            errors.push(ValidationError::new("rate_limit.max_attempts", "must be > 0"));
        }
        if rl.window_secs == 0 || rl.window_secs > MAX_WINDOW_SECS {
            errors.push(ValidationError::new(
                "rate_limit.window_secs",
                format!("must be between 1 and {MAX_WINDOW_SECS}"),
            ));
        }
        if rl.sweep_interval_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.sweep_interval_secs",
                "must be > 0",
            ));
        }
    }

    if config.storage.page_size == 0 || config.storage.page_size > 500 {
        errors.push(ValidationError::new(
            "storage.page_size",
            "must be between 1 and 500",
        ));
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of pretty, json", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    let mut ids = HashSet::new();
    let mut tokens = HashSet::new();
    for (i, account) in config.accounts.iter().enumerate() {
        let field = format!("accounts[{i}]");
        if account.id.trim().is_empty() {
            errors.push(ValidationError::new(&field, "id must not be empty"));
        } else if !ids.insert(account.id.as_str()) {
            errors.push(ValidationError::new(
                &field,
                format!("duplicate account id '{}'", account.id),
            ));
        }
        if account.token.len() < 16 {
            errors.push(ValidationError::new(
                &field,
                "token must be at least 16 characters",
            ));
        } else if !tokens.insert(account.token.as_str()) {
            errors.push(ValidationError::new(&field, "token is shared with another account"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AccountConfig;
    use crate::security::Role;

    fn account(id: &str, token: &str) -> AccountConfig {
        AccountConfig {
            id: id.to_string(),
            role: Role::Therapist,
            token: token.to_string(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&VaultConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = VaultConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.encryption.key_hex = Some("abc".into());
        config.rate_limit.max_attempts = 0;
        config.storage.page_size = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "encryption.key_hex",
                "rate_limit.max_attempts",
                "storage.page_size",
                "observability.log_format",
            ]
        );
    }

    #[test]
    fn test_window_upper_bound() {
        let mut config = VaultConfig::default();
        config.rate_limit.window_secs = MAX_WINDOW_SECS;
        assert!(validate_config(&config).is_ok());

        config.rate_limit.window_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "rate_limit.window_secs");
    }

    #[test]
    fn test_disabled_rate_limit_skips_checks() {
        let mut config = VaultConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.window_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_account_rules() {
        let mut config = VaultConfig::default();
        config.accounts = vec![
            account("t1", "token-aaaaaaaaaaaa"),
            account("t1", "token-bbbbbbbbbbbb"),
            account("t2", "short"),
            account("t3", "token-aaaaaaaaaaaa"),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].message.contains("duplicate account id"));
        assert!(errors[1].message.contains("at least 16"));
        assert!(errors[2].message.contains("shared"));
    }
}
