//! Core collector trait and error type.

use thiserror::Error;

use crate::client::{ClientError, JenkinsClient};

/// Errors that can occur during collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Request to Jenkins failed.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Jenkins answered but the expected data was absent.
    #[error("{0}")]
    MissingData(String),

    /// The feature is not installed or not exposed by this server.
    #[error("{0}")]
    Unavailable(String),
}

impl CollectorError {
    /// Wrap a client error with the name of the data that was being fetched.
    pub fn context(what: &str, err: ClientError) -> Self {
        Self::MissingData(format!("Failed to get {what}: {err}"))
    }
}

/// Core collector trait.
///
/// A collector issues a handful of sequential GETs against one Jenkins
/// server and reshapes the answers into a typed report. Collection is
/// all-or-nothing: either a complete report is returned or an error that
/// the dashboard prints in place of the section.
///
/// Secondary lookups (per-job builds, config.xml scans, plugin-specific
/// endpoints) are best-effort inside `collect()`: their failures are logged
/// and the corresponding fields fall back to defaults.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Report produced by a successful collection.
    type Report: Send;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch and reshape the data.
    async fn collect(&self, client: &JenkinsClient) -> Result<Self::Report, CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_passes_message_through() {
        let err: CollectorError = ClientError::Status(404).into();
        assert_eq!(err.to_string(), "Failed with status code: 404");
    }

    #[test]
    fn test_context_prefixes_message() {
        let err = CollectorError::context("queue information", ClientError::Status(500));
        assert_eq!(
            err.to_string(),
            "Failed to get queue information: Failed with status code: 500"
        );
    }
}
