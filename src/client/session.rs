//! Authenticated Jenkins session.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::ClientError;
use super::html::{first_capture, static_regex};

/// Value reported when the server version cannot be determined.
const UNKNOWN_VERSION: &str = "Unknown";

/// Connection settings for a [`JenkinsClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URL, with or without scheme.
    pub url: String,
    /// Basic auth user.
    pub username: String,
    /// Basic auth password or API token.
    pub password: String,
    /// Verify TLS certificates (default: true).
    pub verify_ssl: bool,
    /// Per-request timeout. `None` keeps the HTTP client default (no timeout).
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration with certificate verification on and no timeout.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            verify_ssl: true,
            timeout: None,
        }
    }

    /// Toggle TLS certificate verification.
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// CSRF crumb issued by `crumbIssuer/api/json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Crumb {
    /// Header name the crumb must be sent under (usually `Jenkins-Crumb`).
    #[serde(rename = "crumbRequestField")]
    pub field: String,
    #[serde(rename = "crumb")]
    pub value: String,
}

/// Result of a successful [`JenkinsClient::login`].
#[derive(Debug, Clone)]
pub struct LoginInfo {
    /// Normalised base URL.
    pub url: String,
    /// Full name of the authenticated user (falls back to the login name).
    pub full_name: String,
    /// Server version from headers or page footer.
    pub version: String,
    /// CSRF crumb, when the server issues one.
    pub crumb: Option<Crumb>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(default)]
    full_name: Option<String>,
}

/// Normalise a user-supplied server URL.
///
/// Adds `https://` when no scheme is given and guarantees a trailing `/`
/// so endpoints can be joined relative to it.
pub fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let mut url = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    if !url.ends_with('/') {
        url.push('/');
    }

    Ok(Url::parse(&url)?)
}

/// Authenticated, read-only Jenkins session.
///
/// Every request is a GET with basic auth; the CSRF crumb obtained at login
/// is attached as a header when available.
pub struct JenkinsClient {
    base: Url,
    username: String,
    password: String,
    http: Client,
    crumb: Option<Crumb>,
}

impl std::fmt::Debug for JenkinsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsClient")
            .field("base", &self.base.as_str())
            .field("username", &self.username)
            .field("crumb", &self.crumb.is_some())
            .finish_non_exhaustive()
    }
}

impl JenkinsClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidUrl` for an unparsable server URL and
    /// `ClientError::Build` if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = normalize_base_url(&config.url)?;

        let mut builder = Client::builder().danger_accept_invalid_certs(!config.verify_ssl);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            base,
            username: config.username,
            password: config.password,
            http,
            crumb: None,
        })
    }

    /// Normalised base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Login name used for basic auth.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http(s)` URLs (e.g. a job's `url` field) are used as-is;
    /// anything else is joined relative to the base with leading `/` removed.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, ClientError> {
        if endpoint.starts_with("http") {
            return Ok(Url::parse(endpoint)?);
        }
        Ok(self.base.join(endpoint.trim_start_matches('/'))?)
    }

    /// Authenticate and collect server identity.
    ///
    /// # Errors
    /// Returns `ClientError::LoginFailed` when `api/json` does not answer 200,
    /// or `ClientError::Connection` when the server is unreachable. Failures
    /// fetching the user name or crumb are logged and tolerated.
    pub async fn login(&mut self) -> Result<LoginInfo, ClientError> {
        tracing::info!(url = %self.base, user = %self.username, "Connecting to Jenkins");

        let response = self.send("api/json", &[]).await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Login rejected");
            return Err(ClientError::LoginFailed(status.as_u16()));
        }

        let headers = response.headers().clone();
        let body = response.text().await?;
        let version = detect_version(&headers, &body);

        let full_name = match self.get_json::<MeResponse>("me/api/json").await {
            Ok(me) => me.full_name.unwrap_or_else(|| self.username.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to retrieve user info");
                self.username.clone()
            }
        };

        self.crumb = match self.get_json::<Crumb>("crumbIssuer/api/json").await {
            Ok(crumb) => {
                tracing::debug!(field = %crumb.field, "Obtained CSRF crumb");
                Some(crumb)
            }
            Err(e) => {
                tracing::debug!(error = %e, "No CSRF crumb available");
                None
            }
        };

        tracing::info!(version = %version, user = %full_name, "Connected to Jenkins");

        Ok(LoginInfo {
            url: self.base.to_string(),
            full_name,
            version,
            crumb: self.crumb.clone(),
        })
    }

    /// GET an endpoint and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        self.fetch_json(endpoint, &[]).await
    }

    /// GET with a `depth` parameter (omitted when zero).
    pub async fn get_json_depth<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        depth: u32,
    ) -> Result<T, ClientError> {
        if depth == 0 {
            return self.fetch_json(endpoint, &[]).await;
        }
        self.fetch_json(endpoint, &[("depth", depth.to_string())])
            .await
    }

    /// GET with a `tree` filter parameter.
    pub async fn get_json_tree<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        tree: &str,
    ) -> Result<T, ClientError> {
        self.fetch_json(endpoint, &[("tree", tree.to_string())])
            .await
    }

    /// GET an endpoint and return its body as text (HTML, XML, console logs).
    pub async fn get_text(&self, endpoint: &str) -> Result<String, ClientError> {
        let response = self.fetch(endpoint, &[]).await?;
        Ok(response.text().await?)
    }

    /// GET an endpoint and return only its response headers.
    pub async fn get_headers(&self, endpoint: &str) -> Result<HeaderMap, ClientError> {
        let response = self.fetch(endpoint, &[]).await?;
        Ok(response.headers().clone())
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.fetch(endpoint, query).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a GET and require a 200 answer.
    async fn fetch(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response, ClientError> {
        let response = self.send(endpoint, query).await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Request failed");
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn send(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response, ClientError> {
        let url = self.resolve(endpoint)?;
        tracing::debug!(url = %url, "GET");

        let mut request = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password));

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(crumb) = &self.crumb {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(crumb.field.as_bytes()),
                HeaderValue::from_str(&crumb.value),
            ) {
                request = request.header(name, value);
            }
        }

        Ok(request.send().await?)
    }
}

/// Read the server version from `X-Jenkins`, then `jenkins-version`, then
/// the "Jenkins ver." footer of an HTML body.
fn detect_version(headers: &HeaderMap, body: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-jenkins")
        .or_else(|| header("jenkins-version"))
        .or_else(|| first_capture(static_regex!(r"Jenkins ver\. ([0-9.]+)"), body))
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
