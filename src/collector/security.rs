//! Security configuration scraped from the configure-security page and the
//! root response headers.

use reqwest::header::HeaderMap;

use crate::client::JenkinsClient;
use crate::client::html::{UNKNOWN, first_capture, static_regex};
use crate::collector::{Collector, CollectorError};

/// Page marker to authorization strategy class, first match wins.
const STRATEGY_MARKERS: &[(&str, &str)] = &[
    ("Matrix Authorization", "GlobalMatrixAuthorizationStrategy"),
    ("Project-based Matrix", "ProjectMatrixAuthorizationStrategy"),
    ("Role-Based Strategy", "RoleBasedAuthorizationStrategy"),
    (
        "Logged-in users can do anything",
        "FullControlOnceLoggedInAuthorizationStrategy",
    ),
];

/// Presence of hardening headers on the root page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityHeaders {
    pub content_security_policy: bool,
    pub x_content_type_options: bool,
    pub x_frame_options: bool,
}

impl SecurityHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            content_security_policy: headers.contains_key("content-security-policy"),
            x_content_type_options: headers.contains_key("x-content-type-options"),
            x_frame_options: headers.contains_key("x-frame-options"),
        }
    }
}

/// A hardening setting compared against its recommended state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub name: &'static str,
    pub enabled: bool,
    pub recommended: bool,
}

impl Recommendation {
    pub fn is_good(&self) -> bool {
        self.enabled == self.recommended
    }

    pub fn status(&self) -> &'static str {
        if self.is_good() { "Good" } else { "Warning" }
    }
}

/// Security configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityReport {
    pub security_realm: String,
    pub ldap_server: Option<String>,
    pub authorization_strategy: String,
    pub csrf_protection: bool,
    /// `None` when the root headers could not be fetched.
    pub headers: Option<SecurityHeaders>,
}

impl SecurityReport {
    pub fn from_page(html: &str, headers: Option<SecurityHeaders>) -> Self {
        let (security_realm, ldap_server) = if html.contains("LDAP") {
            (
                "LDAPSecurityRealm".to_string(),
                ldap_field(html, "server"),
            )
        } else {
            (UNKNOWN.to_string(), None)
        };

        let authorization_strategy = STRATEGY_MARKERS
            .iter()
            .find(|(marker, _)| html.contains(marker))
            .map_or(UNKNOWN, |(_, class)| *class)
            .to_string();

        Self {
            security_realm,
            ldap_server,
            authorization_strategy,
            csrf_protection: html.contains("CSRF Protection"),
            headers,
        }
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        let headers = self.headers.unwrap_or_default();
        [
            ("CSRF Protection", self.csrf_protection),
            ("Content Security Policy", headers.content_security_policy),
            ("X-Content-Type-Options", headers.x_content_type_options),
            ("X-Frame-Options", headers.x_frame_options),
        ]
        .into_iter()
        .map(|(name, enabled)| Recommendation {
            name,
            enabled,
            recommended: true,
        })
        .collect()
    }
}

/// Value of an LDAP form input such as `_.server` or `_.rootDN`.
pub fn ldap_field(html: &str, field: &str) -> Option<String> {
    let re = regex::Regex::new(&format!(
        r#"name="_.?{}"[^>]*value="([^"]+)""#,
        regex::escape(field)
    ))
    .ok()?;
    first_capture(&re, html)
}

/// Collects [`SecurityReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityCollector;

#[async_trait::async_trait]
impl Collector for SecurityCollector {
    type Report = SecurityReport;

    fn name(&self) -> &'static str {
        "security"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<SecurityReport, CollectorError> {
        let html = client
            .get_text("manage/configureSecurity/")
            .await
            .map_err(|e| {
                CollectorError::MissingData(format!(
                    "Could not access security configuration page: {e}"
                ))
            })?;

        let headers = match client.get_headers("").await {
            Ok(headers) => Some(SecurityHeaders::from_headers(&headers)),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read root headers");
                None
            }
        };

        Ok(SecurityReport::from_page(&html, headers))
    }
}

/// SIDs of the permission matrix rows (`row-group-<sid>`), sorted.
pub(crate) fn matrix_row_users(html: &str) -> Vec<String> {
    let mut users: Vec<String> = static_regex!(r#"row-group-(\w+)""#)
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect();
    users.sort();
    users.dedup();
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    const PAGE: &str = r#"
        <div>LDAP</div>
        <input name="_.server" type="text" value="ldap://ldap.example.com:389">
        <input name="_.rootDN" value="dc=example,dc=com">
        <label>Role-Based Strategy</label>
        <h2>CSRF Protection</h2>
        <tr id="row-group-admin"></tr><tr id="row-group-dev"></tr><tr id="row-group-admin"></tr>
    "#;

    #[test]
    fn test_from_page() {
        let report = SecurityReport::from_page(PAGE, None);
        assert_eq!(report.security_realm, "LDAPSecurityRealm");
        assert_eq!(report.ldap_server.as_deref(), Some("ldap://ldap.example.com:389"));
        assert_eq!(report.authorization_strategy, "RoleBasedAuthorizationStrategy");
        assert!(report.csrf_protection);
    }

    #[test]
    fn test_from_page_defaults() {
        let report = SecurityReport::from_page("<html></html>", None);
        assert_eq!(report.security_realm, UNKNOWN);
        assert_eq!(report.ldap_server, None);
        assert_eq!(report.authorization_strategy, UNKNOWN);
        assert!(!report.csrf_protection);
    }

    #[test]
    fn test_recommendations() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("sameorigin"));
        let report = SecurityReport::from_page(PAGE, Some(SecurityHeaders::from_headers(&headers)));

        let recs = report.recommendations();
        let status: Vec<_> = recs.iter().map(|r| (r.name, r.status())).collect();
        assert_eq!(
            status,
            vec![
                ("CSRF Protection", "Good"),
                ("Content Security Policy", "Warning"),
                ("X-Content-Type-Options", "Warning"),
                ("X-Frame-Options", "Good"),
            ]
        );
    }

    #[test]
    fn test_ldap_field_and_matrix_users() {
        assert_eq!(ldap_field(PAGE, "rootDN").as_deref(), Some("dc=example,dc=com"));
        assert_eq!(ldap_field(PAGE, "groupSearchBase"), None);
        assert_eq!(matrix_row_users(PAGE), vec!["admin", "dev"]);
    }
}
