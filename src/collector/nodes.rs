//! Node overview: status, executors, monitors, OS detection and connection
//! type for every computer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::api::{Computer, ComputerSet, NodeStatus};
use crate::client::html::{UNKNOWN, static_regex};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};
use crate::format::format_timestamp;

// =============================================================================
// Connection type
// =============================================================================

/// Friendly connection type from a computer `_class`.
pub fn connection_type(class: Option<&str>) -> String {
    let class = match class {
        Some(c) if !c.is_empty() => c,
        _ => return UNKNOWN.to_string(),
    };

    let label = if class.contains("hudson.slaves.DumbSlave") {
        "Agent"
    } else if class.contains("hudson.model.Hudson$MasterComputer") {
        "Built-in Node"
    } else if class.contains("hudson.slaves.SlaveComputer") {
        "Agent"
    } else if class.contains("jenkins.slaves.JnlpSlaveAgentProtocol")
        || class.contains("JNLPLauncher")
    {
        "JNLP Agent"
    } else if class.contains("SSHLauncher") {
        "SSH Agent"
    } else if class.contains("ComputerLauncher") {
        "Custom Launcher"
    } else if class.contains("DockerComputer") {
        "Docker Agent"
    } else if class.contains("KubernetesComputer") {
        "Kubernetes Agent"
    } else if class.contains("EC2Computer") {
        "EC2 Agent"
    } else {
        "Unknown Agent Type"
    };
    label.to_string()
}

// =============================================================================
// OS detection
// =============================================================================

/// Detected operating system: family and versioned name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsInfo {
    pub name: String,
    pub full_name: String,
}

impl OsInfo {
    fn new(name: &str, full_name: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            full_name: full_name.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }
}

/// How a matched pattern becomes a full OS name.
#[derive(Clone, Copy)]
enum Naming {
    /// `"{prefix} {capture}"` with `_`/`-` normalised to `.`.
    Versioned(&'static str),
    /// `"{prefix} {capture}"` verbatim.
    Plain(&'static str),
    /// A fixed name (codenames).
    Fixed(&'static str),
}

struct OsPattern {
    regex: Regex,
    family: &'static str,
    naming: Naming,
}

impl OsPattern {
    fn apply(&self, text: &str) -> Option<OsInfo> {
        let caps = self.regex.captures(text)?;
        let version = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let full_name = match self.naming {
            Naming::Versioned(prefix) => format!("{prefix} {}", version.replace(['_', '-'], ".")),
            Naming::Plain(prefix) => format!("{prefix} {version}"),
            Naming::Fixed(name) => name.to_string(),
        };
        Some(OsInfo::new(self.family, full_name))
    }
}

fn compile(table: &[(&str, &'static str, Naming)]) -> Vec<OsPattern> {
    table
        .iter()
        .map(|(pattern, family, naming)| OsPattern {
            regex: Regex::new(pattern).expect("failed to compile OS pattern"),
            family: *family,
            naming: *naming,
        })
        .collect()
}

fn label_patterns() -> &'static [OsPattern] {
    static PATTERNS: OnceLock<Vec<OsPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            (r"ubuntu[\-_]?(\d+[\.\-_]?\d+)", "Ubuntu", Naming::Versioned("Ubuntu")),
            (r"centos[\-_]?(\d+(\.\d+)*)", "CentOS", Naming::Versioned("CentOS")),
            (r"rhel[\-_]?(\d+(\.\d+)*)", "RHEL", Naming::Versioned("RHEL")),
            (r"debian[\-_]?(\d+(\.\d+)*)", "Debian", Naming::Versioned("Debian")),
            (r"fedora[\-_]?(\d+)", "Fedora", Naming::Plain("Fedora")),
            (r"win[\-_]?(\d+)", "Windows", Naming::Plain("Windows")),
            (r"windows[\-_]?(\d+)", "Windows", Naming::Plain("Windows")),
            (r"win[\-_]?server[\-_]?(\d+)", "Windows", Naming::Plain("Windows Server")),
            (r"bionic", "Ubuntu", Naming::Fixed("Ubuntu 18.04")),
            (r"focal", "Ubuntu", Naming::Fixed("Ubuntu 20.04")),
            (r"jammy", "Ubuntu", Naming::Fixed("Ubuntu 22.04")),
            (r"noble", "Ubuntu", Naming::Fixed("Ubuntu 24.04")),
            (r"buster", "Debian", Naming::Fixed("Debian 10")),
            (r"bullseye", "Debian", Naming::Fixed("Debian 11")),
            (r"bookworm", "Debian", Naming::Fixed("Debian 12")),
        ])
    })
}

fn name_patterns() -> &'static [OsPattern] {
    static PATTERNS: OnceLock<Vec<OsPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            (r"ubuntu[\-_]?(\d+[\.\-_]?\d+)", "Ubuntu", Naming::Versioned("Ubuntu")),
            (r"bionic", "Ubuntu", Naming::Fixed("Ubuntu 18.04")),
            (r"focal", "Ubuntu", Naming::Fixed("Ubuntu 20.04")),
            (r"jammy", "Ubuntu", Naming::Fixed("Ubuntu 22.04")),
            (r"centos[\-_]?(\d+)", "CentOS", Naming::Plain("CentOS")),
            (r"rhel[\-_]?(\d+)", "RHEL", Naming::Plain("RHEL")),
            (r"debian[\-_]?(\d+)", "Debian", Naming::Plain("Debian")),
            (r"win[\-_]?(\d+)", "Windows", Naming::Plain("Windows")),
            (r"win[\-_]?server[\-_]?(\d+)", "Windows", Naming::Plain("Windows Server")),
        ])
    })
}

fn linux_distro_patterns() -> &'static [OsPattern] {
    static PATTERNS: OnceLock<Vec<OsPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile(&[
            (r"Ubuntu\s+(\d+\.\d+)", "Ubuntu", Naming::Plain("Ubuntu")),
            (r"CentOS\s+(\d+(\.\d+)*)", "CentOS", Naming::Plain("CentOS")),
            (r"RHEL\s+(\d+(\.\d+)*)", "RHEL", Naming::Plain("RHEL")),
            (r"Debian\s+(\d+(\.\d+)*)", "Debian", Naming::Plain("Debian")),
            (r"Fedora\s+(\d+)", "Fedora", Naming::Plain("Fedora")),
        ])
    })
}

/// OS from node labels (distribution tags or release codenames).
pub fn os_from_labels(labels: &str) -> Option<OsInfo> {
    if labels.is_empty() {
        return None;
    }
    let lower = labels.to_lowercase();
    label_patterns().iter().find_map(|p| p.apply(&lower))
}

/// OS guessed from a node name.
pub fn os_from_name(name: &str) -> Option<OsInfo> {
    if name.is_empty() {
        return None;
    }
    let lower = name.to_lowercase();
    if let Some(info) = name_patterns().iter().find_map(|p| p.apply(&lower)) {
        return Some(info);
    }

    let family = if lower.contains("ubuntu") {
        "Ubuntu"
    } else if lower.contains("centos") {
        "CentOS"
    } else if lower.contains("rhel") || lower.contains("redhat") {
        "RHEL"
    } else if lower.contains("debian") {
        "Debian"
    } else if lower.contains("fedora") {
        "Fedora"
    } else if lower.contains("win") {
        "Windows"
    } else {
        return None;
    };
    Some(OsInfo::new(family, family))
}

/// Detect a node's OS.
///
/// Labels win over the `ArchitectureMonitor` string. The architecture string
/// is read as `<Family> <version>...`; a bare `Linux` falls back to the node
/// name for the distribution.
pub fn detect_os(labels: &str, node_name: &str, architecture: &str) -> OsInfo {
    if let Some(info) = os_from_labels(labels) {
        return info;
    }

    let family_re =
        static_regex!(r"^(Windows|Linux|Mac|macOS|Ubuntu|CentOS|RHEL|Debian|Fedora)");
    let Some(family) = family_re
        .captures(architecture)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return OsInfo::unknown();
    };

    match family {
        "Windows" => {
            let version_re =
                static_regex!(r"^Windows\s+(Server\s+\d+|\d+|XP|Vista|7|8|8.1|10|11)");
            match version_re.captures(architecture).and_then(|c| c.get(1)) {
                Some(v) => OsInfo::new("Windows", format!("Windows {}", v.as_str())),
                None => OsInfo::new("Windows", "Windows"),
            }
        }
        "Linux" => linux_distro_patterns()
            .iter()
            .find_map(|p| p.apply(architecture))
            .or_else(|| os_from_name(node_name))
            .unwrap_or_else(|| OsInfo::new("Linux", "Linux")),
        "Mac" | "macOS" => {
            let version_re = static_regex!(
                r"(Mac|macOS)\s+((\d+(\.\d+)*)|Catalina|Big Sur|Monterey|Ventura|Sonoma)"
            );
            match version_re.captures(architecture).and_then(|c| c.get(2)) {
                Some(v) => OsInfo::new("macOS", format!("macOS {}", v.as_str())),
                None => OsInfo::new(family, "macOS"),
            }
        }
        other => OsInfo::new(other, other),
    }
}

// =============================================================================
// Overview
// =============================================================================

/// One node of the overview.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub name: String,
    pub description: String,
    pub status: NodeStatus,
    pub jvm_version: String,
    pub labels: Vec<String>,
    pub num_executors: u32,
    pub idle_executors: u32,
    pub busy_executors: u32,
    pub disk_bytes: Option<u64>,
    pub disk_path: Option<String>,
    pub response_time_ms: Option<f64>,
    pub architecture: Option<String>,
    pub os: OsInfo,
    pub connection_type: String,
    pub last_connection: String,
}

impl NodeRow {
    pub fn from_computer(computer: &Computer) -> Self {
        let labels = computer.labels();
        let status = computer.status();
        let monitors = &computer.monitor_data;

        let architecture = monitors
            .architecture
            .clone()
            .filter(|a| !a.is_empty());
        let os = match &architecture {
            Some(arch) => detect_os(&labels.join(" "), &computer.display_name, arch),
            None => OsInfo::unknown(),
        };

        let disk = monitors
            .disk_space
            .as_ref()
            .filter(|d| d.size.is_some() && d.path.is_some());

        let last_connection = match (status, computer.connect_time) {
            (NodeStatus::Online | NodeStatus::TemporarilyOffline, _) => {
                "Currently Connected".to_string()
            }
            (_, Some(ts)) if ts > 0 => format_timestamp(ts),
            (_, Some(_)) => "Never".to_string(),
            (_, None) => UNKNOWN.to_string(),
        };

        let idle = computer.executors.iter().filter(|e| e.idle).count() as u32;

        Self {
            name: computer.display_name.clone(),
            description: computer.description.clone().unwrap_or_default(),
            status,
            jvm_version: computer.jvm_version().unwrap_or_else(|| UNKNOWN.to_string()),
            labels,
            num_executors: computer.num_executors,
            idle_executors: idle,
            busy_executors: computer.busy_executors(),
            disk_bytes: disk.and_then(|d| d.size),
            disk_path: disk.and_then(|d| d.path.clone()),
            response_time_ms: monitors.response_time.as_ref().and_then(|r| r.average),
            architecture,
            os,
            connection_type: connection_type(computer.class.as_deref()),
            last_connection,
        }
    }

    /// Busy executors as a percentage of this node's executors.
    pub fn utilization(&self) -> f64 {
        if self.num_executors == 0 {
            0.0
        } else {
            self.busy_executors as f64 / self.num_executors as f64 * 100.0
        }
    }
}

/// Node counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStatusCounts {
    pub online: usize,
    pub offline: usize,
    pub temp_offline: usize,
}

impl NodeStatusCounts {
    pub fn record(&mut self, status: NodeStatus) {
        match status {
            NodeStatus::Online => self.online += 1,
            NodeStatus::Offline => self.offline += 1,
            NodeStatus::TemporarilyOffline => self.temp_offline += 1,
        }
    }
}

/// Overview of every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodesReport {
    pub total_executors: u32,
    pub busy_executors: u32,
    pub idle_executors: u32,
    pub status_counts: NodeStatusCounts,
    pub nodes: Vec<NodeRow>,
    pub all_labels: BTreeSet<String>,
    /// Versioned OS name to node count, for nodes reporting an architecture.
    pub os_distribution: BTreeMap<String, usize>,
}

impl NodesReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut report = Self {
            total_executors: set.total_executors,
            busy_executors: set.busy_executors,
            idle_executors: set.total_executors.saturating_sub(set.busy_executors),
            ..Self::default()
        };

        for computer in &set.computer {
            let row = NodeRow::from_computer(computer);
            report.status_counts.record(row.status);
            report.all_labels.extend(row.labels.iter().cloned());
            if row.architecture.is_some() {
                *report
                    .os_distribution
                    .entry(row.os.full_name.clone())
                    .or_default() += 1;
            }
            report.nodes.push(row);
        }

        report
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Busy executors as a percentage of all executors.
    pub fn executor_utilization(&self) -> f64 {
        if self.total_executors == 0 {
            0.0
        } else {
            self.busy_executors as f64 / self.total_executors as f64 * 100.0
        }
    }

    /// OS family to node count.
    pub fn os_families(&self) -> BTreeMap<String, usize> {
        let mut families = BTreeMap::new();
        for node in &self.nodes {
            *families.entry(node.os.name.clone()).or_default() += 1;
        }
        families
    }

    /// Connection type to node count.
    pub fn connection_types(&self) -> BTreeMap<String, usize> {
        let mut types = BTreeMap::new();
        for node in &self.nodes {
            *types.entry(node.connection_type.clone()).or_default() += 1;
        }
        types
    }
}

/// Collects [`NodesReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NodesCollector;

#[async_trait::async_trait]
impl Collector for NodesCollector {
    type Report = NodesReport;

    fn name(&self) -> &'static str {
        "nodes"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<NodesReport, CollectorError> {
        let set: ComputerSet = client.get_json_depth("computer/api/json", 2).await?;
        Ok(NodesReport::from_computers(&set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==========================================================================
    // Connection type
    // ==========================================================================

    #[test]
    fn test_connection_type_mapping() {
        assert_eq!(
            connection_type(Some("hudson.model.Hudson$MasterComputer")),
            "Built-in Node"
        );
        assert_eq!(connection_type(Some("hudson.slaves.SlaveComputer")), "Agent");
        assert_eq!(
            connection_type(Some("org.csanchez.jenkins.plugins.kubernetes.KubernetesComputer")),
            "Kubernetes Agent"
        );
        assert_eq!(connection_type(Some("com.example.Odd")), "Unknown Agent Type");
        assert_eq!(connection_type(None), UNKNOWN);
    }

    // ==========================================================================
    // OS detection
    // ==========================================================================

    #[test]
    fn test_os_from_labels() {
        assert_eq!(
            os_from_labels("docker ubuntu-22_04").unwrap().full_name,
            "Ubuntu 22.04"
        );
        assert_eq!(os_from_labels("linux jammy").unwrap().full_name, "Ubuntu 22.04");
        assert_eq!(os_from_labels("bookworm").unwrap().full_name, "Debian 12");
        assert_eq!(os_from_labels("win2019").unwrap().full_name, "Windows 2019");
        assert!(os_from_labels("docker x64").is_none());
        assert!(os_from_labels("").is_none());
    }

    #[test]
    fn test_os_from_name_fallbacks() {
        assert_eq!(os_from_name("build-centos7").unwrap().full_name, "CentOS 7");
        assert_eq!(os_from_name("redhat-box").unwrap().name, "RHEL");
        assert!(os_from_name("agent-01").is_none());
    }

    #[test]
    fn test_detect_os_architecture() {
        let win = detect_os("", "agent", "Windows Server 2019 (amd64)");
        assert_eq!(win.name, "Windows");
        assert_eq!(win.full_name, "Windows Server 2019");

        let linux = detect_os("", "agent", "Linux (amd64)");
        assert_eq!(linux.full_name, "Linux");

        let linux_named = detect_os("", "ubuntu-20.04-agent", "Linux (amd64)");
        assert_eq!(linux_named.full_name, "Ubuntu 20.04");

        let mac = detect_os("", "agent", "Mac OS X (aarch64)");
        assert_eq!(mac.full_name, "macOS");

        let unknown = detect_os("", "agent", "SunOS (sparc)");
        assert_eq!(unknown, OsInfo::unknown());
    }

    #[test]
    fn test_detect_os_labels_win() {
        let info = detect_os("focal", "agent", "Linux (amd64)");
        assert_eq!(info.full_name, "Ubuntu 20.04");
    }

    // ==========================================================================
    // Overview
    // ==========================================================================

    fn sample() -> ComputerSet {
        serde_json::from_value(json!({
            "busyExecutors": 1,
            "totalExecutors": 4,
            "computer": [
                {
                    "_class": "hudson.model.Hudson$MasterComputer",
                    "displayName": "Built-In Node",
                    "offline": false,
                    "numExecutors": 2,
                    "executors": [{"idle": false}, {"idle": true}],
                    "assignedLabels": [{"name": "built-in"}],
                    "monitorData": {
                        "hudson.node_monitors.ArchitectureMonitor": "Linux (amd64)",
                        "hudson.node_monitors.DiskSpaceMonitor": {"path": "/var/jenkins", "size": 1073741824},
                        "hudson.node_monitors.ResponseTimeMonitor": {"average": 3},
                        "hudson.node_monitors.JavaInfo": {"version": "17.0.9"}
                    }
                },
                {
                    "_class": "hudson.slaves.SlaveComputer",
                    "displayName": "agent-1",
                    "offline": true,
                    "temporarilyOffline": false,
                    "numExecutors": 2,
                    "labelString": "linux jammy",
                    "connectTime": 0,
                    "monitorData": {}
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_computers() {
        let report = NodesReport::from_computers(&sample());
        assert_eq!(report.total_nodes(), 2);
        assert_eq!(report.idle_executors, 3);
        assert_eq!(report.status_counts.online, 1);
        assert_eq!(report.status_counts.offline, 1);
        assert!((report.executor_utilization() - 25.0).abs() < 1e-9);
        assert!(report.all_labels.contains("jammy"));

        // only nodes with an architecture string are counted
        assert_eq!(report.os_distribution.get("Linux"), Some(&1));
        assert_eq!(report.os_distribution.len(), 1);

        let master = &report.nodes[0];
        assert_eq!(master.connection_type, "Built-in Node");
        assert_eq!(master.busy_executors, 1);
        assert_eq!(master.jvm_version, "17.0.9");
        assert_eq!(master.disk_bytes, Some(1073741824));
        assert_eq!(master.last_connection, "Currently Connected");

        let agent = &report.nodes[1];
        assert_eq!(agent.os, OsInfo::unknown());
        assert_eq!(agent.last_connection, "Never");
        assert_eq!(agent.busy_executors, 2);
    }

    #[test]
    fn test_os_families() {
        let report = NodesReport::from_computers(&sample());
        let families = report.os_families();
        assert_eq!(families.get("Linux"), Some(&1));
        assert_eq!(families.get(UNKNOWN), Some(&1));
    }
}
