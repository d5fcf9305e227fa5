//! Per-node operating system breakdown, with a Linux distribution drill-down.

use std::collections::BTreeMap;

use crate::api::{Computer, ComputerSet};
use crate::client::JenkinsClient;
use crate::client::html::{UNKNOWN, extract_property, first_capture, static_regex};
use crate::collector::{Collector, CollectorError};

/// OS names counted as Linux.
const LINUX_NAMES: &[&str] = &[
    "Linux", "Ubuntu", "CentOS", "Debian", "Red Hat", "RHEL", "Fedora", "SUSE",
];

/// `systemInfo` properties probed on Linux nodes.
const LINUX_PROPERTIES: &[&str] = &["lsb.release", "lsb_release", "DISTRIB_ID", "DISTRIB_RELEASE"];

/// Top-level OS category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum OsCategory {
    Windows,
    Linux,
    Mac,
    Other,
}

impl OsCategory {
    pub fn of(os_name: &str) -> Self {
        if os_name.contains("Windows") {
            Self::Windows
        } else if is_linux(os_name) {
            Self::Linux
        } else if os_name.contains("Mac") || os_name.contains("Darwin") {
            Self::Mac
        } else {
            Self::Other
        }
    }
}

fn is_linux(os_name: &str) -> bool {
    LINUX_NAMES.contains(&os_name)
}

/// OS facts of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct OsDetail {
    pub node_name: String,
    pub os_name: String,
    pub os_version: String,
    pub os_arch: String,
    pub kernel_version: String,
    pub full_description: String,
    pub category: OsCategory,
    /// Extra `systemInfo` properties, filled by the Linux drill-down.
    pub properties: BTreeMap<String, String>,
}

impl OsDetail {
    pub fn from_computer(computer: &Computer) -> Self {
        let arch_info = computer.monitor_data.architecture.as_deref();
        let (mut os_name, mut os_version, mut os_arch) = computer
            .system_info()
            .unwrap_or_else(|| (UNKNOWN.to_string(), String::new(), String::new()));

        if os_name == UNKNOWN {
            if let Some(arch) = arch_info {
                if arch.contains("Windows") {
                    os_name = "Windows".to_string();
                    if let Some(v) = first_capture(
                        static_regex!(r"Windows\s+(\d+(?:\.\d+)?|Server\s+\d+|\w+)"),
                        arch,
                    ) {
                        os_version = v;
                    }
                } else if arch.contains("Linux") {
                    os_name = "Linux".to_string();
                    let distro = static_regex!(
                        r"(?i)(Ubuntu|CentOS|Debian|Red\s*Hat|RHEL|Fedora|SUSE)[^\d]*(\d+(?:\.\d+)?)?"
                    );
                    if let Some(caps) = distro.captures(arch) {
                        os_name = caps[1].to_string();
                        if let Some(v) = caps.get(2) {
                            os_version = v.as_str().to_string();
                        }
                    }
                } else if arch.contains("Mac") || arch.contains("Darwin") {
                    os_name = "Mac".to_string();
                    if let Some(v) = first_capture(static_regex!(r"(\d+\.\d+(?:\.\d+)?)"), arch) {
                        os_version = v;
                    }
                }
            }
        }

        if os_arch.is_empty() {
            if let Some(a) = arch_info.and_then(|a| first_capture(static_regex!(r"\((.*?)\)"), a)) {
                os_arch = a;
            }
        }

        let kernel_version = if is_linux(&os_name) {
            arch_info
                .and_then(|a| first_capture(static_regex!(r"Linux\s+(\d+\.\d+\.\d+[^\s)]*)"), a))
                .unwrap_or_default()
        } else {
            String::new()
        };

        Self {
            node_name: computer.display_name.clone(),
            category: OsCategory::of(&os_name),
            os_name,
            os_version,
            os_arch,
            kernel_version,
            full_description: arch_info.unwrap_or(UNKNOWN).to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// `"{name} {version}"`, trimmed.
    pub fn key(&self) -> String {
        format!("{} {}", self.os_name, self.os_version)
            .trim()
            .to_string()
    }

    /// Record the distribution properties present on a node's `systemInfo` page.
    pub fn apply_system_info(&mut self, html: &str) {
        for key in LINUX_PROPERTIES {
            let value = extract_property(html, key);
            if value != UNKNOWN {
                self.properties.insert(key.to_string(), value);
            }
        }
    }
}

/// OS breakdown of every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsDetailReport {
    pub details: Vec<OsDetail>,
    /// Category -> `"{name} {version}"` -> node count.
    pub distribution: BTreeMap<OsCategory, BTreeMap<String, usize>>,
    pub linux_distributions: BTreeMap<String, usize>,
}

impl OsDetailReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut report = Self::default();
        for computer in &set.computer {
            let detail = OsDetail::from_computer(computer);
            if is_linux(&detail.os_name) {
                *report
                    .linux_distributions
                    .entry(detail.os_name.clone())
                    .or_default() += 1;
            }
            *report
                .distribution
                .entry(detail.category)
                .or_default()
                .entry(detail.key())
                .or_default() += 1;
            report.details.push(detail);
        }
        report
    }

    /// Node count per category, every category present.
    pub fn totals(&self) -> BTreeMap<OsCategory, usize> {
        use strum::IntoEnumIterator;
        OsCategory::iter()
            .map(|c| {
                let total = self.distribution.get(&c).map_or(0, |d| d.values().sum());
                (c, total)
            })
            .collect()
    }

    /// Node count per OS name, most common first.
    pub fn os_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for detail in &self.details {
            *counts.entry(detail.os_name.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, n)| (name.to_string(), n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn linux_nodes(&self) -> impl Iterator<Item = &OsDetail> {
        self.details
            .iter()
            .filter(|d| d.category == OsCategory::Linux)
    }
}

/// Collects [`OsDetailReport`]. With [`OsDetailCollector::with_linux_details`]
/// each Linux node's `systemInfo` page is also scraped.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDetailCollector {
    linux_details: bool,
}

impl OsDetailCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linux_details(mut self, enabled: bool) -> Self {
        self.linux_details = enabled;
        self
    }
}

#[async_trait::async_trait]
impl Collector for OsDetailCollector {
    type Report = OsDetailReport;

    fn name(&self) -> &'static str {
        "os_detail"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<OsDetailReport, CollectorError> {
        let set: ComputerSet = client
            .get_json_depth("computer/api/json", 2)
            .await
            .map_err(|e| CollectorError::context("OS details", e))?;
        let mut report = OsDetailReport::from_computers(&set);

        if self.linux_details {
            for detail in &mut report.details {
                if detail.category != OsCategory::Linux {
                    continue;
                }
                let page = format!("computer/{}/systemInfo", detail.node_name);
                match client.get_text(&page).await {
                    Ok(html) => detail.apply_system_info(&html),
                    Err(e) => tracing::debug!(node = %detail.node_name, error = %e, "No systemInfo page"),
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn computer(value: serde_json::Value) -> Computer {
        serde_json::from_value(value).unwrap()
    }

    // ========================================================================
    // Detection
    // ========================================================================

    #[test]
    fn test_detail_from_architecture() {
        let detail = OsDetail::from_computer(&computer(json!({
            "displayName": "build-01",
            "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Linux 5.15.0-91-generic (amd64)"}
        })));
        assert_eq!(detail.os_name, "Linux");
        assert_eq!(detail.os_arch, "amd64");
        assert_eq!(detail.kernel_version, "5.15.0-91-generic");
        assert_eq!(detail.category, OsCategory::Linux);
        assert_eq!(detail.key(), "Linux");
    }

    #[test]
    fn test_detail_distro_in_architecture() {
        let detail = OsDetail::from_computer(&computer(json!({
            "displayName": "u",
            "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Linux Ubuntu 22.04 (amd64)"}
        })));
        assert_eq!(detail.os_name, "Ubuntu");
        assert_eq!(detail.os_version, "22.04");
        assert_eq!(detail.category, OsCategory::Linux);
    }

    #[test]
    fn test_detail_windows_and_mac() {
        let win = OsDetail::from_computer(&computer(json!({
            "displayName": "w",
            "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Windows Server 2019 (amd64)"}
        })));
        assert_eq!(win.os_name, "Windows");
        assert_eq!(win.os_version, "Server 2019");
        assert_eq!(win.category, OsCategory::Windows);

        let mac = OsDetail::from_computer(&computer(json!({
            "displayName": "m",
            "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Mac OS X 13.4.1 (aarch64)"}
        })));
        assert_eq!(mac.os_version, "13.4.1");
        assert_eq!(mac.category, OsCategory::Mac);
    }

    #[test]
    fn test_detail_system_info_wins() {
        let detail = OsDetail::from_computer(&computer(json!({
            "displayName": "s",
            "monitorData": {
                "hudson.node_monitors.ArchitectureMonitor": "Linux (amd64)",
                "hudson.node_monitors.SystemInfo": {"name": "Debian", "version": "12", "arch": "x86_64"}
            }
        })));
        assert_eq!(detail.os_name, "Debian");
        assert_eq!(detail.os_arch, "x86_64");
        assert_eq!(detail.key(), "Debian 12");
    }

    #[test]
    fn test_detail_without_monitor_data() {
        let detail = OsDetail::from_computer(&computer(json!({"displayName": "x"})));
        assert_eq!(detail.os_name, UNKNOWN);
        assert_eq!(detail.full_description, UNKNOWN);
        assert_eq!(detail.category, OsCategory::Other);
    }

    // ========================================================================
    // Report
    // ========================================================================

    #[test]
    fn test_report_distribution() {
        let set: ComputerSet = serde_json::from_value(json!({
            "computer": [
                {"displayName": "a", "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Linux (amd64)"}},
                {"displayName": "b", "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Linux (arm64)"}},
                {"displayName": "c", "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Windows 10 (amd64)"}},
                {"displayName": "d"}
            ]
        }))
        .unwrap();

        let report = OsDetailReport::from_computers(&set);
        assert_eq!(report.linux_distributions.get("Linux"), Some(&2));
        assert_eq!(report.distribution[&OsCategory::Windows].get("Windows 10"), Some(&1));

        let totals = report.totals();
        assert_eq!(totals[&OsCategory::Linux], 2);
        assert_eq!(totals[&OsCategory::Mac], 0);
        assert_eq!(totals[&OsCategory::Other], 1);

        assert_eq!(report.os_counts()[0], ("Linux".to_string(), 2));
        assert_eq!(report.linux_nodes().count(), 2);
    }

    #[test]
    fn test_apply_system_info() {
        let mut detail = OsDetail::from_computer(&computer(json!({"displayName": "a"})));
        detail.apply_system_info("<tr><td>DISTRIB_ID</td><td>Ubuntu</td></tr>");
        assert_eq!(detail.properties.get("DISTRIB_ID").map(String::as_str), Some("Ubuntu"));
        assert!(!detail.properties.contains_key("lsb.release"));
    }
}
