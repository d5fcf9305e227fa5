//! Configuration module for the Jenkins dashboard.
//!
//! Provides optional YAML-based configuration loading and validation for:
//! - Server settings (url, credentials, TLS verification, timeout)
//! - Display settings (colors, table row limit)
//! - Collector limits and alert thresholds

mod app;
mod validation;

pub use app::{AppConfig, DisplayConfig, LimitsConfig, ServerConfig};
pub use validation::{ConfigError, expand_env_vars, validate_server_url, validate_thresholds};

// Re-export constants
pub use app::{DEFAULT_CONFIG_SAMPLE, DEFAULT_JOB_TYPE_SAMPLE, DEFAULT_LIST_LIMIT, DEFAULT_MAX_ROWS};
