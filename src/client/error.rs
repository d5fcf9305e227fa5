//! Client error types.

use thiserror::Error;

/// Errors raised by [`JenkinsClient`](super::JenkinsClient) requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-200 status.
    #[error("Failed with status code: {0}")]
    Status(u16),

    /// The initial authenticated request was rejected.
    #[error("Login failed with status code: {0}")]
    LoginFailed(u16),

    /// Transport-level failure (DNS, TLS, connection refused, timeout).
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server URL or an endpoint could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) | Self::LoginFailed(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            ClientError::Status(404).to_string(),
            "Failed with status code: 404"
        );
        assert_eq!(
            ClientError::LoginFailed(401).to_string(),
            "Login failed with status code: 401"
        );
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(ClientError::Status(500).status(), Some(500));
        assert_eq!(ClientError::Build("x".into()).status(), None);
    }
}
