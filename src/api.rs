//! Jenkins REST payloads.
//!
//! Only the fields the collectors read are modelled. Everything is optional
//! or defaulted because Jenkins omits fields freely depending on the `tree`
//! or `depth` requested, installed plugins, and node state.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

fn default_true() -> bool {
    true
}

// =============================================================================
// Root (`api/json`)
// =============================================================================

/// Top-level `api/json` document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootInfo {
    pub node_name: Option<String>,
    pub node_description: Option<String>,
    pub mode: Option<String>,
    pub use_security: Option<bool>,
    pub use_crumbs: Option<bool>,
    pub quieting_down: Option<bool>,
    pub num_executors: Option<u32>,
    pub slave_agent_port: Option<i64>,
    pub url: Option<String>,
    pub views: Vec<ViewRef>,
    pub primary_view: Option<ViewRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewRef {
    pub name: String,
    pub url: Option<String>,
}

// =============================================================================
// Jobs & builds
// =============================================================================

/// `api/json?tree=jobs[...]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobList {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(rename = "_class")]
    pub class: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub color: Option<String>,
    pub buildable: Option<bool>,
    pub in_queue: Option<bool>,
    pub first_build: Option<Build>,
    pub last_build: Option<Build>,
    pub builds: Vec<Build>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    pub number: Option<u64>,
    pub timestamp: Option<i64>,
    pub result: Option<String>,
    pub duration: Option<i64>,
    pub building: Option<bool>,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artifact {
    pub file_name: Option<String>,
    pub display_path: Option<String>,
    pub relative_path: Option<String>,
    pub size: Option<u64>,
}

/// `{job}api/json?tree=_class`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobClass {
    #[serde(rename = "_class")]
    pub class: Option<String>,
}

// =============================================================================
// Computers (`computer/api/json`)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputerSet {
    pub busy_executors: u32,
    pub total_executors: u32,
    pub computer: Vec<Computer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Computer {
    #[serde(rename = "_class", default)]
    pub class: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Missing means the agent never reported, so treat it as offline.
    #[serde(default = "default_true")]
    pub offline: bool,
    #[serde(default)]
    pub temporarily_offline: bool,
    #[serde(default)]
    pub num_executors: u32,
    #[serde(default)]
    pub executors: Vec<Executor>,
    #[serde(default)]
    pub assigned_labels: Vec<LabelRef>,
    #[serde(default)]
    pub label_string: Option<String>,
    #[serde(default)]
    pub monitor_data: MonitorData,
    #[serde(default)]
    pub connect_time: Option<i64>,
    #[serde(default)]
    pub offline_cause_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Executor {
    #[serde(default = "default_true")]
    pub idle: bool,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub current_executable: Option<Executable>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Executable {
    pub number: Option<u64>,
    pub url: Option<String>,
    pub display_name: Option<String>,
    pub full_display_name: Option<String>,
}

/// Node monitor readings keyed by monitor class.
///
/// Monitors report `null` while an agent is offline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorData {
    #[serde(rename = "hudson.node_monitors.DiskSpaceMonitor")]
    pub disk_space: Option<DiskSpace>,
    #[serde(rename = "hudson.node_monitors.TemporarySpaceMonitor")]
    pub temporary_space: Option<DiskSpace>,
    #[serde(rename = "hudson.node_monitors.ResponseTimeMonitor")]
    pub response_time: Option<ResponseTime>,
    #[serde(rename = "hudson.node_monitors.ArchitectureMonitor")]
    pub architecture: Option<String>,
    #[serde(rename = "hudson.node_monitors.SwapSpaceMonitor")]
    pub swap_space: Option<SwapSpace>,
    #[serde(rename = "hudson.node_monitors.ClockMonitor")]
    pub clock: Option<ClockDifference>,
    #[serde(rename = "hudson.node_monitors.SystemLoadMonitor")]
    pub system_load: Option<SystemLoad>,
    /// Object with a `version` field, or a bare string on some versions.
    #[serde(rename = "hudson.node_monitors.JavaInfo")]
    pub java_info: Option<Value>,
    /// Object with `name`/`version`/`arch`, or a bare string.
    #[serde(rename = "hudson.node_monitors.SystemInfo")]
    pub system_info: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskSpace {
    pub path: Option<String>,
    pub size: Option<u64>,
    pub free_space: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseTime {
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwapSpace {
    pub total_physical_memory: Option<u64>,
    pub available_physical_memory: Option<u64>,
    pub total_swap_space: Option<u64>,
    pub available_swap_space: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClockDifference {
    pub diff: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemLoad {
    pub load_average: Option<f64>,
}

impl Computer {
    /// Sorted, de-duplicated labels from `assignedLabels`, falling back to
    /// splitting `labelString` on whitespace and commas.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .assigned_labels
            .iter()
            .filter_map(|l| l.name.as_deref())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if labels.is_empty() {
            if let Some(label_string) = &self.label_string {
                labels = label_string
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }

        labels.sort();
        labels.dedup();
        labels
    }

    /// Whether the node is offline but not deliberately taken offline.
    pub fn status(&self) -> NodeStatus {
        match (self.offline, self.temporarily_offline) {
            (false, _) => NodeStatus::Online,
            (true, true) => NodeStatus::TemporarilyOffline,
            (true, false) => NodeStatus::Offline,
        }
    }

    /// Executors currently running a build.
    pub fn busy_executors(&self) -> u32 {
        let idle = self.executors.iter().filter(|e| e.idle).count() as u32;
        self.num_executors.saturating_sub(idle)
    }

    /// JVM version reported by the `JavaInfo` monitor.
    pub fn jvm_version(&self) -> Option<String> {
        match self.monitor_data.java_info.as_ref()? {
            Value::Object(map) => map.get("version")?.as_str().map(str::to_string),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// `(name, version, arch)` from the `SystemInfo` monitor.
    pub fn system_info(&self) -> Option<(String, String, String)> {
        let field = |map: &serde_json::Map<String, Value>, key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match self.monitor_data.system_info.as_ref()? {
            Value::Object(map) => Some((
                map.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown")
                    .to_string(),
                field(map, "version"),
                field(map, "arch"),
            )),
            Value::String(name) => Some((name.clone(), String::new(), String::new())),
            _ => None,
        }
    }
}

/// Connectivity state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
pub enum NodeStatus {
    Online,
    Offline,
    #[strum(serialize = "Temporarily Offline")]
    TemporarilyOffline,
}

// =============================================================================
// Queue
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Queue {
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueItem {
    pub in_queue_since: i64,
    pub why: Option<String>,
    pub task: Option<QueueTask>,
    pub actions: Vec<QueueAction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueTask {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QueueAction {
    pub causes: Vec<Cause>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cause {
    pub short_description: Option<String>,
}

// =============================================================================
// Plugins
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginManager {
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plugin {
    pub short_name: String,
    pub long_name: Option<String>,
    pub version: Option<String>,
    pub active: bool,
    pub enabled: bool,
    pub has_update: bool,
    pub update_info: Option<UpdateInfo>,
    /// Either plain strings or `{name: ...}` objects.
    pub categories: Vec<Value>,
    pub release_timestamp: Option<i64>,
    pub url: Option<String>,
}

impl Plugin {
    /// Long name when present, otherwise the short name.
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.short_name)
    }

    /// Name of the first category, if any.
    pub fn primary_category(&self) -> Option<String> {
        match self.categories.first()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => Some(
                map.get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("Other")
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateInfo {
    pub version: Option<String>,
}

/// `updateCenter/api/json?depth=2`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCenter {
    pub sites: Vec<UpdateSite>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSite {
    pub id: Option<String>,
    pub plugins: BTreeMap<String, UpdateInfo>,
}

// =============================================================================
// Metrics plugin
// =============================================================================

/// `metrics/{key}/metrics` style gauge document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsDocument {
    pub gauges: BTreeMap<String, Gauge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Gauge {
    pub value: Option<Value>,
}

impl MetricsDocument {
    /// JVM uptime in milliseconds, when the gauge is published.
    pub fn uptime_ms(&self) -> Option<u64> {
        let value = self.gauges.get("vm.uptime.milliseconds")?.value.as_ref()?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|v| v.max(0.0) as u64))
            .filter(|v| *v > 0)
    }
}

// =============================================================================
// Security
// =============================================================================

/// `configureSecurity/api/json` (only exposed by some versions/plugins).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    pub security_realm: Option<ClassRef>,
    pub authorization_strategy: Option<AuthorizationStrategy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassRef {
    #[serde(rename = "_class")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizationStrategy {
    #[serde(rename = "_class")]
    pub class: Option<String>,
    /// Permission id to list of SIDs.
    pub data: BTreeMap<String, Value>,
}

/// `_class` of a fully qualified Java class, without the package.
pub fn simple_class_name(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_computer_defaults_offline() {
        let computer: Computer = serde_json::from_value(json!({"displayName": "ghost"})).unwrap();
        assert!(computer.offline);
        assert_eq!(computer.status(), NodeStatus::Offline);
    }

    #[test]
    fn test_computer_labels_from_assigned() {
        let computer: Computer = serde_json::from_value(json!({
            "displayName": "agent-1",
            "assignedLabels": [{"name": "linux"}, {"name": "docker"}, {"name": " "}, {"name": "linux"}],
            "labelString": "ignored"
        }))
        .unwrap();
        assert_eq!(computer.labels(), vec!["docker", "linux"]);
    }

    #[test]
    fn test_computer_labels_from_label_string() {
        let computer: Computer = serde_json::from_value(json!({
            "displayName": "agent-2",
            "labelString": "linux, x64  docker"
        }))
        .unwrap();
        assert_eq!(computer.labels(), vec!["docker", "linux", "x64"]);
    }

    #[test]
    fn test_computer_busy_executors() {
        let computer: Computer = serde_json::from_value(json!({
            "displayName": "agent",
            "offline": false,
            "numExecutors": 4,
            "executors": [{"idle": true}, {"idle": false}, {"idle": true}, {"idle": false}]
        }))
        .unwrap();
        assert_eq!(computer.busy_executors(), 2);
        assert_eq!(computer.status(), NodeStatus::Online);
    }

    #[test]
    fn test_monitor_data_nulls() {
        let computer: Computer = serde_json::from_value(json!({
            "displayName": "offline-agent",
            "temporarilyOffline": true,
            "monitorData": {
                "hudson.node_monitors.DiskSpaceMonitor": null,
                "hudson.node_monitors.ArchitectureMonitor": null,
                "hudson.node_monitors.JavaInfo": "17.0.2"
            }
        }))
        .unwrap();
        assert!(computer.monitor_data.disk_space.is_none());
        assert_eq!(computer.jvm_version().as_deref(), Some("17.0.2"));
        assert_eq!(computer.status().to_string(), "Temporarily Offline");
    }

    #[test]
    fn test_plugin_names_and_categories() {
        let plugin: Plugin = serde_json::from_value(json!({
            "shortName": "git",
            "longName": "Git plugin",
            "categories": [{"name": "scm"}]
        }))
        .unwrap();
        assert_eq!(plugin.display_name(), "Git plugin");
        assert_eq!(plugin.primary_category().as_deref(), Some("scm"));
    }

    #[test]
    fn test_metrics_uptime() {
        let doc: MetricsDocument = serde_json::from_value(json!({
            "gauges": {"vm.uptime.milliseconds": {"value": 90061000}}
        }))
        .unwrap();
        assert_eq!(doc.uptime_ms(), Some(90_061_000));
    }

    #[test]
    fn test_simple_class_name() {
        assert_eq!(
            simple_class_name("org.jenkinsci.plugins.workflow.job.WorkflowJob"),
            "WorkflowJob"
        );
        assert_eq!(simple_class_name("Bare"), "Bare");
    }
}
