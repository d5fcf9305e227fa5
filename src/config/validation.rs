//! Checks applied to a loaded configuration, plus `${VAR}` expansion.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::alerts::AlertThresholds;
use crate::client::normalize_base_url;

/// Errors raised while loading the dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read dashboard config: {0}")]
    IoError(#[from] std::io::Error),

    /// The YAML is malformed or has the wrong shape.
    #[error("malformed dashboard config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A value is out of range or inconsistent.
    #[error("invalid dashboard config: {0}")]
    ValidationError(String),
}

/// Substitute `${NAME}` and `${NAME:-fallback}` references from the process
/// environment. Unset names without a fallback become empty.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_REF: OnceLock<Regex> = OnceLock::new();
    let env_ref = ENV_REF.get_or_init(|| {
        Regex::new(r"\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?::-(?P<fallback>[^}]*))?\}")
            .expect("static regex")
    });

    env_ref
        .replace_all(input, |caps: &Captures| {
            std::env::var(&caps["name"]).unwrap_or_else(|_| {
                caps.name("fallback")
                    .map_or_else(String::new, |m| m.as_str().to_string())
            })
        })
        .into_owned()
}

/// Check that a server URL is http(s) and well formed.
/// A bare host is accepted and treated as https.
pub fn validate_server_url(raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("server url cannot be empty".to_string());
    }
    if raw.contains("://") && !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(format!("server url must use http or https: '{raw}'"));
    }
    normalize_base_url(raw)
        .map(|_| ())
        .map_err(|e| format!("invalid server url '{raw}': {e}"))
}

/// Check threshold ranges and warning/critical ordering.
pub fn validate_thresholds(t: &AlertThresholds) -> Result<(), String> {
    for (name, value) in t.percentages() {
        if !(0.0..=100.0).contains(&value) {
            return Err(format!("threshold {name} must be within 0..=100, got {value}"));
        }
    }
    if t.disk_warning > t.disk_critical {
        return Err("disk_warning must not exceed disk_critical".to_string());
    }
    if t.queue_warning > t.queue_critical {
        return Err("queue_warning must not exceed queue_critical".to_string());
    }
    // Success rates alert when falling below, so the order is reversed.
    if t.success_rate_critical > t.success_rate_warning {
        return Err("success_rate_critical must not exceed success_rate_warning".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_leaves_plain_text() {
        assert_eq!(expand_env_vars("verify_ssl: true"), "verify_ssl: true");
        assert_eq!(expand_env_vars("cost: $5"), "cost: $5");
    }

    #[test]
    fn test_expand_unset_without_fallback_is_empty() {
        assert_eq!(expand_env_vars("user: ${UNSET_JENKINS_DASHBOARD_USER_987}"), "user: ");
    }

    #[test]
    fn test_expand_uses_fallback() {
        let result = expand_env_vars("url: ${NONEXISTENT_JENKINS_URL_12345:-ci.example.com}");
        assert_eq!(result, "url: ci.example.com");
    }

    #[test]
    fn test_expand_reads_environment() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("TEST_JENKINS_PASSWORD_EXPAND", "s3cret");
        }
        let result = expand_env_vars("password: ${TEST_JENKINS_PASSWORD_EXPAND}");
        assert_eq!(result, "password: s3cret");
        // SAFETY: as above.
        unsafe {
            std::env::remove_var("TEST_JENKINS_PASSWORD_EXPAND");
        }
    }

    #[test]
    fn test_validate_server_url() {
        assert!(validate_server_url("https://ci.example.com").is_ok());
        assert!(validate_server_url("http://localhost:8080/jenkins").is_ok());
        assert!(validate_server_url("ci.example.com").is_ok());
        assert!(validate_server_url("").is_err());
        assert!(
            validate_server_url("ftp://ci.example.com")
                .unwrap_err()
                .contains("http or https")
        );
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(&AlertThresholds::default()).is_ok());

        let out_of_range = AlertThresholds {
            disk_critical: 120.0,
            ..AlertThresholds::default()
        };
        assert!(validate_thresholds(&out_of_range).unwrap_err().contains("disk_critical"));

        let inverted = AlertThresholds {
            queue_warning: 30,
            ..AlertThresholds::default()
        };
        assert!(validate_thresholds(&inverted).unwrap_err().contains("queue_warning"));

        let rates = AlertThresholds {
            success_rate_critical: 80.0,
            ..AlertThresholds::default()
        };
        assert!(validate_thresholds(&rates).is_err());
    }
}
