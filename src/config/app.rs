//! Application configuration structures.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::AlertThresholds;
use crate::client::ClientConfig;

use super::validation::{ConfigError, expand_env_vars, validate_server_url, validate_thresholds};

// =============================================================================
// Constants
// =============================================================================

/// Default number of table rows printed before truncating.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Default number of rows for per-job listings (failed jobs, build stats, ...).
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Default number of jobs whose class is inspected for the type breakdown.
pub const DEFAULT_JOB_TYPE_SAMPLE: usize = 50;

/// Default number of job `config.xml` documents sampled.
pub const DEFAULT_CONFIG_SAMPLE: usize = 20;

fn default_true() -> bool {
    true
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Jenkins server connection. Every field can be overridden from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server URL; a bare host is treated as https.
    pub url: Option<String>,

    pub username: Option<String>,

    /// Password or API token.
    pub password: Option<String>,

    /// Verify TLS certificates (default: true).
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// Request timeout (e.g., "30s"). No timeout when unset.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            verify_ssl: true,
            timeout: None,
        }
    }
}

impl ServerConfig {
    /// Build a client configuration, or `None` while url or credentials are missing.
    pub fn to_client_config(&self) -> Option<ClientConfig> {
        let (url, username, password) = (
            self.url.as_deref()?,
            self.username.as_deref()?,
            self.password.as_deref()?,
        );
        let mut config = ClientConfig::new(url, username, password).with_verify_ssl(self.verify_ssl);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Some(config)
    }
}

// =============================================================================
// Display Configuration
// =============================================================================

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// ANSI colors (default: true).
    pub color: bool,

    /// Rows per table before truncating (default: 20).
    pub max_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

// =============================================================================
// Limits
// =============================================================================

/// How much each collector fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub failed_jobs: usize,
    pub build_stats: usize,
    pub artifacts: usize,
    pub recent_builds: usize,
    pub job_type_sample: usize,
    pub config_sample: usize,
    pub queue_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            failed_jobs: DEFAULT_LIST_LIMIT,
            build_stats: DEFAULT_LIST_LIMIT,
            artifacts: DEFAULT_LIST_LIMIT,
            recent_builds: DEFAULT_LIST_LIMIT,
            job_type_sample: DEFAULT_JOB_TYPE_SAMPLE,
            config_sample: DEFAULT_CONFIG_SAMPLE,
            queue_items: DEFAULT_LIST_LIMIT,
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub limits: LimitsConfig,
    pub thresholds: AlertThresholds,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// # Errors
    /// Returns `ConfigError` if parsing or validation fails.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(&expand_env_vars(content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server.url {
            validate_server_url(url).map_err(ConfigError::ValidationError)?;
        }

        if self.display.max_rows == 0 {
            return Err(ConfigError::ValidationError(
                "display max_rows must be positive".to_string(),
            ));
        }

        validate_thresholds(&self.thresholds).map_err(ConfigError::ValidationError)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.url, None);
        assert!(config.verify_ssl);
        assert_eq!(config.timeout, None);
        assert!(config.to_client_config().is_none());
    }

    #[test]
    fn test_limits_config_default() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.failed_jobs, 10);
        assert_eq!(limits.job_type_sample, 50);
        assert_eq!(limits.config_sample, 20);
        assert_eq!(limits.queue_items, 10);
    }

    #[test]
    fn test_app_config_default_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.display.max_rows, DEFAULT_MAX_ROWS);
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  url: https://ci.example.com
  username: admin
  password: ${{NONEXISTENT_DASHBOARD_TOKEN_999:-fallback}}
  verify_ssl: false
  timeout: 30s
display:
  color: false
  max_rows: 5
limits:
  failed_jobs: 3
thresholds:
  disk_warning: 70
  queue_critical: 40
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.url.as_deref(), Some("https://ci.example.com"));
        assert_eq!(config.server.password.as_deref(), Some("fallback"));
        assert!(!config.server.verify_ssl);
        assert_eq!(config.server.timeout, Some(Duration::from_secs(30)));
        assert!(!config.display.color);
        assert_eq!(config.display.max_rows, 5);
        assert_eq!(config.limits.failed_jobs, 3);
        assert_eq!(config.limits.build_stats, 10);
        assert_eq!(config.thresholds.disk_warning, 70.0);
        assert_eq!(config.thresholds.disk_critical, 95.0);
        assert_eq!(config.thresholds.queue_critical, 40);

        let client = config.server.to_client_config().unwrap();
        assert!(!client.verify_ssl);
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/nonexistent/jenkins-dashboard.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let result = AppConfig::from_yaml("server: [not, a, map");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_config_validation_invalid_url() {
        let result = AppConfig::from_yaml("server:\n  url: ftp://ci.example.com\n");
        assert!(result.unwrap_err().to_string().contains("http or https"));
    }

    #[test]
    fn test_config_validation_zero_rows() {
        let config = AppConfig {
            display: DisplayConfig {
                color: true,
                max_rows: 0,
            },
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, ConfigError::ValidationError(msg) if msg.contains("max_rows")));
    }

    #[test]
    fn test_config_validation_inverted_thresholds() {
        let result = AppConfig::from_yaml("thresholds:\n  disk_warning: 99\n  disk_critical: 90\n");
        assert!(result.unwrap_err().to_string().contains("disk_warning"));
    }
}
