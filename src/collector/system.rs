//! Core system information: version, mode, views and JVM/OS properties.

use crate::api::{MetricsDocument, RootInfo};
use crate::client::html::{UNKNOWN, extract_property, first_capture, static_regex};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};
use crate::format::format_uptime;

/// Basic system information.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemReport {
    pub version: String,
    pub node_name: String,
    pub node_description: String,
    pub mode: String,
    pub use_security: bool,
    pub views: usize,
    pub primary_view: String,
    pub java_version: String,
    pub os_name: String,
    pub os_version: String,
    pub os_arch: String,
    pub jenkins_home: String,
    pub timezone: String,
    pub uptime: String,
}

impl SystemReport {
    fn from_root(root: &RootInfo, version: String) -> Self {
        Self {
            version,
            node_name: root.node_name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            node_description: root.node_description.clone().unwrap_or_default(),
            mode: root.mode.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            use_security: root.use_security.unwrap_or(false),
            views: root.views.len(),
            primary_view: root
                .primary_view
                .as_ref()
                .map(|v| v.name.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            java_version: UNKNOWN.to_string(),
            os_name: UNKNOWN.to_string(),
            os_version: UNKNOWN.to_string(),
            os_arch: UNKNOWN.to_string(),
            jenkins_home: UNKNOWN.to_string(),
            timezone: UNKNOWN.to_string(),
            uptime: UNKNOWN.to_string(),
        }
    }

    /// Fill the JVM/OS fields from the `systemInfo` page.
    fn apply_system_info(&mut self, html: &str) {
        self.java_version = extract_property(html, "java.runtime.version");
        self.os_name = extract_property(html, "os.name");
        self.os_version = extract_property(html, "os.version");
        self.os_arch = extract_property(html, "os.arch");
        self.jenkins_home = extract_property(html, "JENKINS_HOME");
        self.timezone = extract_property(html, "user.timezone");
    }
}

/// Uptime text from the `about` page ("Running for: ...").
pub fn uptime_from_about(html: &str) -> Option<String> {
    if !html.contains("Running for") {
        return None;
    }
    first_capture(static_regex!(r"Running for:\s*([^<]+)"), html)
}

/// Collects [`SystemReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCollector;

impl SystemCollector {
    async fn uptime(&self, client: &JenkinsClient) -> String {
        let endpoint = format!("metrics/{}/api/json", client.username());
        match client.get_json::<MetricsDocument>(&endpoint).await {
            Ok(doc) => {
                if let Some(ms) = doc.uptime_ms() {
                    return format_uptime(ms);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Metrics plugin not available"),
        }

        match client.get_text("about").await {
            Ok(html) => uptime_from_about(&html).unwrap_or_else(|| UNKNOWN.to_string()),
            Err(_) => UNKNOWN.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Collector for SystemCollector {
    type Report = SystemReport;

    fn name(&self) -> &'static str {
        "system"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<SystemReport, CollectorError> {
        let root: RootInfo = client.get_json("api/json").await?;

        let version = match client.get_headers("").await {
            Ok(headers) => headers
                .get("x-jenkins")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(UNKNOWN)
                .to_string(),
            Err(_) => UNKNOWN.to_string(),
        };

        let mut report = SystemReport::from_root(&root, version);

        if let Ok(html) = client.get_text("systemInfo").await {
            report.apply_system_info(&html);
            report.uptime = self.uptime(client).await;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_root_defaults() {
        let root: RootInfo = serde_json::from_value(json!({})).unwrap();
        let report = SystemReport::from_root(&root, "2.440".into());
        assert_eq!(report.version, "2.440");
        assert_eq!(report.mode, UNKNOWN);
        assert_eq!(report.primary_view, UNKNOWN);
        assert!(!report.use_security);
        assert_eq!(report.views, 0);
    }

    #[test]
    fn test_from_root_fields() {
        let root: RootInfo = serde_json::from_value(json!({
            "mode": "NORMAL",
            "useSecurity": true,
            "views": [{"name": "all"}, {"name": "ops"}],
            "primaryView": {"name": "all"}
        }))
        .unwrap();
        let report = SystemReport::from_root(&root, "2.440".into());
        assert_eq!(report.mode, "NORMAL");
        assert!(report.use_security);
        assert_eq!(report.views, 2);
        assert_eq!(report.primary_view, "all");
    }

    #[test]
    fn test_apply_system_info() {
        let html = "<tr><td>java.runtime.version</td><td>17.0.9</td></tr>\
                    <tr><td>os.name</td><td>Linux</td></tr>";
        let mut report = SystemReport::from_root(&RootInfo::default(), "x".into());
        report.apply_system_info(html);
        assert_eq!(report.java_version, "17.0.9");
        assert_eq!(report.os_name, "Linux");
        assert_eq!(report.timezone, UNKNOWN);
    }

    #[test]
    fn test_uptime_from_about() {
        assert_eq!(
            uptime_from_about("<p>Running for: 3 days 2 hr</p>").as_deref(),
            Some("3 days 2 hr")
        );
        assert_eq!(uptime_from_about("<p>nothing</p>"), None);
    }
}
