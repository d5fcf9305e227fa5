//! Condensed node statistics for the overview.

use std::collections::{BTreeMap, BTreeSet};

use crate::api::ComputerSet;
use crate::client::JenkinsClient;
use crate::collector::nodes::{NodeStatusCounts, connection_type};
use crate::collector::{Collector, CollectorError};

/// Coarse OS family from an `ArchitectureMonitor` string.
pub fn os_family(architecture: &str) -> &'static str {
    if architecture.contains("Windows") {
        "Windows"
    } else if architecture.contains("Linux") {
        "Linux"
    } else if architecture.contains("Mac") {
        "Mac"
    } else {
        "Other"
    }
}

/// Node summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodesSummaryReport {
    pub total_nodes: usize,
    pub status: NodeStatusCounts,
    pub total_executors: u32,
    pub busy_executors: u32,
    pub idle_executors: u32,
    pub executor_utilization: f64,
    pub os_families: BTreeMap<String, usize>,
    pub connection_types: BTreeMap<String, usize>,
    pub total_labels: usize,
}

impl NodesSummaryReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut report = Self {
            total_nodes: set.computer.len(),
            total_executors: set.total_executors,
            busy_executors: set.busy_executors,
            idle_executors: set.total_executors.saturating_sub(set.busy_executors),
            executor_utilization: if set.total_executors > 0 {
                set.busy_executors as f64 / set.total_executors as f64 * 100.0
            } else {
                0.0
            },
            ..Self::default()
        };

        let mut labels = BTreeSet::new();
        for computer in &set.computer {
            report.status.record(computer.status());

            if let Some(arch) = &computer.monitor_data.architecture {
                *report
                    .os_families
                    .entry(os_family(arch).to_string())
                    .or_default() += 1;
            }

            let conn = connection_type(computer.class.as_deref());
            *report.connection_types.entry(conn).or_default() += 1;

            labels.extend(
                computer
                    .assigned_labels
                    .iter()
                    .filter_map(|l| l.name.as_deref())
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string),
            );
        }
        report.total_labels = labels.len();

        report
    }
}

/// Collects [`NodesSummaryReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NodesSummaryCollector;

#[async_trait::async_trait]
impl Collector for NodesSummaryCollector {
    type Report = NodesSummaryReport;

    fn name(&self) -> &'static str {
        "nodes_summary"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<NodesSummaryReport, CollectorError> {
        let set: ComputerSet = client.get_json_depth("computer/api/json", 1).await?;
        Ok(NodesSummaryReport::from_computers(&set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_os_family() {
        assert_eq!(os_family("Windows 10 (amd64)"), "Windows");
        assert_eq!(os_family("Linux (amd64)"), "Linux");
        assert_eq!(os_family("Mac OS X (aarch64)"), "Mac");
        assert_eq!(os_family("FreeBSD (amd64)"), "Other");
    }

    #[test]
    fn test_from_computers() {
        let set: ComputerSet = serde_json::from_value(json!({
            "busyExecutors": 3,
            "totalExecutors": 4,
            "computer": [
                {"_class": "hudson.model.Hudson$MasterComputer", "displayName": "built-in", "offline": false,
                 "assignedLabels": [{"name": "built-in"}],
                 "monitorData": {"hudson.node_monitors.ArchitectureMonitor": "Linux (amd64)"}},
                {"_class": "hudson.slaves.SlaveComputer", "displayName": "win", "offline": true, "temporarilyOffline": true,
                 "assignedLabels": [{"name": "windows"}, {"name": "built-in"}]},
                {"displayName": "ghost"}
            ]
        }))
        .unwrap();

        let report = NodesSummaryReport::from_computers(&set);
        assert_eq!(report.total_nodes, 3);
        assert_eq!(report.status.online, 1);
        assert_eq!(report.status.temp_offline, 1);
        assert_eq!(report.status.offline, 1);
        assert_eq!(report.idle_executors, 1);
        assert!((report.executor_utilization - 75.0).abs() < 1e-9);
        assert_eq!(report.os_families.get("Linux"), Some(&1));
        assert_eq!(report.connection_types.get("Agent"), Some(&1));
        assert_eq!(report.connection_types.get("Unknown"), Some(&1));
        assert_eq!(report.total_labels, 2);
    }
}
