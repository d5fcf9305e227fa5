//! Extended controller information: JVM, servlet container, security and
//! running mode.

use chrono::{Duration as ChronoDuration, Local};

use crate::api::{ClassRef, MetricsDocument, PluginManager, RootInfo, simple_class_name};
use crate::client::html::{UNKNOWN, extract_property};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};
use crate::format::format_uptime_full;

/// Plugins whose presence means the controller runs clustered.
const CLUSTER_PLUGINS: [&str; 3] = ["cluster", "ha-clustered", "kubernetes"];

/// Detailed controller information.
///
/// String fields hold [`UNKNOWN`] when the value could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoReport {
    pub version: String,
    pub node_name: String,
    pub node_description: String,
    pub url: String,
    pub jenkins_home: String,
    pub war_file: String,
    pub config_file: String,
    pub temp_dir: String,
    pub log_level: String,
    pub update_center_url: String,
    pub agent_protocols: String,
    pub uptime: String,
    pub startup_time: String,
    pub java_runtime: String,
    pub java_version: String,
    pub java_vm: String,
    pub java_home: String,
    pub java_vendor: String,
    pub os_name: String,
    pub os_version: String,
    pub os_arch: String,
    pub timezone: String,
    pub servlet_container: String,
    pub servlet_version: String,
    pub use_security: bool,
    pub security_realm: String,
    pub authorization_strategy: String,
    pub csrf_protection: String,
    pub running_mode: String,
    pub agent_port: String,
    pub primary_view: String,
    pub views: usize,
}

impl Default for InfoReport {
    fn default() -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            version: unknown(),
            node_name: unknown(),
            node_description: String::new(),
            url: unknown(),
            jenkins_home: unknown(),
            war_file: unknown(),
            config_file: unknown(),
            temp_dir: unknown(),
            log_level: unknown(),
            update_center_url: unknown(),
            agent_protocols: unknown(),
            uptime: unknown(),
            startup_time: unknown(),
            java_runtime: unknown(),
            java_version: unknown(),
            java_vm: unknown(),
            java_home: unknown(),
            java_vendor: unknown(),
            os_name: unknown(),
            os_version: unknown(),
            os_arch: unknown(),
            timezone: unknown(),
            servlet_container: unknown(),
            servlet_version: unknown(),
            use_security: false,
            security_realm: unknown(),
            authorization_strategy: unknown(),
            csrf_protection: unknown(),
            running_mode: unknown(),
            agent_port: unknown(),
            primary_view: unknown(),
            views: 0,
        }
    }
}

impl InfoReport {
    fn apply_root(&mut self, root: &RootInfo) {
        if let Some(name) = &root.node_name {
            self.node_name = name.clone();
        }
        self.node_description = root.node_description.clone().unwrap_or_default();
        if let Some(url) = &root.url {
            self.url = url.clone();
        }
        if let Some(port) = root.slave_agent_port {
            self.agent_port = port.to_string();
        }
        if let Some(view) = &root.primary_view {
            self.primary_view = view.name.clone();
        }
        self.use_security = root.use_security.unwrap_or(false);
        self.views = root.views.len();
        if let Some(crumbs) = root.use_crumbs {
            self.csrf_protection = enabled_label(crumbs).to_string();
        }
    }

    /// Fill JVM, OS and controller-specific properties from `systemInfo`.
    pub fn apply_system_info(&mut self, html: &str) {
        let fields: [(&mut String, &str); 18] = [
            (&mut self.java_runtime, "java.runtime.name"),
            (&mut self.java_version, "java.runtime.version"),
            (&mut self.java_home, "java.home"),
            (&mut self.java_vendor, "java.vendor"),
            (&mut self.java_vm, "java.vm.name"),
            (&mut self.timezone, "user.timezone"),
            (&mut self.os_name, "os.name"),
            (&mut self.os_version, "os.version"),
            (&mut self.os_arch, "os.arch"),
            (&mut self.jenkins_home, "JENKINS_HOME"),
            (&mut self.war_file, "executable-war"),
            (&mut self.temp_dir, "java.io.tmpdir"),
            (&mut self.log_level, "hudson.logging.LogRecorderManager.level"),
            (&mut self.servlet_container, "jenkins.servlet.name"),
            (&mut self.servlet_version, "jenkins.servlet.version"),
            (&mut self.agent_protocols, "jenkins.AgentProtocol.enabled"),
            (&mut self.config_file, "Config File"),
            (
                &mut self.update_center_url,
                "hudson.model.UpdateCenter.updateCenterUrl",
            ),
        ];

        for (slot, key) in fields {
            *slot = extract_property(html, key);
        }
    }

    fn apply_uptime(&mut self, uptime_ms: u64) {
        self.uptime = format_uptime_full(uptime_ms);
        let started = ChronoDuration::try_milliseconds(uptime_ms as i64)
            .and_then(|d| Local::now().checked_sub_signed(d));
        if let Some(started) = started {
            self.startup_time = started.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "Enabled" } else { "Disabled" }
}

/// Simple class name of a `{_class: ...}` reference.
fn class_label(class: Option<&ClassRef>) -> String {
    class
        .and_then(|c| c.class.as_deref())
        .map(|c| simple_class_name(c).to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// "Clustered" when a clustering plugin is installed, otherwise "Standalone".
pub fn running_mode(plugins: &PluginManager) -> &'static str {
    let clustered = plugins
        .plugins
        .iter()
        .any(|p| CLUSTER_PLUGINS.contains(&p.short_name.as_str()));
    if clustered { "Clustered" } else { "Standalone" }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SecurityApi {
    authorization_strategy: Option<ClassRef>,
    security_realm: Option<ClassRef>,
    use_crumbs: Option<bool>,
}

/// Collects [`InfoReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InfoCollector;

#[async_trait::async_trait]
impl Collector for InfoCollector {
    type Report = InfoReport;

    fn name(&self) -> &'static str {
        "info"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<InfoReport, CollectorError> {
        let mut report = InfoReport::default();

        let root: RootInfo = client.get_json("api/json").await?;
        report.apply_root(&root);

        if let Ok(html) = client.get_text("systemInfo").await {
            if let Ok(headers) = client.get_headers("").await {
                if let Some(version) = headers.get("x-jenkins").and_then(|v| v.to_str().ok()) {
                    report.version = version.to_string();
                }
            }
            report.apply_system_info(&html);
        }

        let metrics = format!("metrics/{}/api/json", client.username());
        if let Some(ms) = client
            .get_json::<MetricsDocument>(&metrics)
            .await
            .ok()
            .and_then(|doc| doc.uptime_ms())
        {
            report.apply_uptime(ms);
        }

        match client
            .get_json::<SecurityApi>("manage/configureSecurity/api/json")
            .await
        {
            Ok(security) => {
                report.authorization_strategy = class_label(security.authorization_strategy.as_ref());
                report.security_realm = class_label(security.security_realm.as_ref());
                if let Some(crumbs) = security.use_crumbs {
                    report.csrf_protection = enabled_label(crumbs).to_string();
                }
            }
            Err(e) => tracing::debug!(error = %e, "Security configuration API not exposed"),
        }

        if let Ok(plugins) = client
            .get_json::<PluginManager>("pluginManager/api/json")
            .await
        {
            report.running_mode = running_mode(&plugins).to_string();
        }

        Ok(report)
    }
}
