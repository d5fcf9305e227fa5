//! Disk usage from node monitors and the disk-usage plugin.

use serde::Deserialize;

use crate::api::ComputerSet;
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};
use crate::format::bytes_to_gb;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DiskUsagePlugin {
    jobs_disk_usage: Option<u64>,
    builds_disk_usage: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HomeUsage {
    size: Option<u64>,
}

/// Disk usage summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskReport {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub total_gb: f64,
    pub free_gb: f64,
    pub used_gb: f64,
    pub usage_percent: f64,
    pub job_disk_usage: Option<u64>,
    pub build_disk_usage: Option<u64>,
    pub jenkins_home_size: Option<u64>,
}

impl DiskReport {
    /// Totals from the `DiskSpaceMonitor` readings.
    ///
    /// Every node reports the same controller-side filesystem in the common
    /// single-host setup, so the last reading wins rather than being summed.
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut total = 0u64;
        let mut free = 0u64;

        for disk in set
            .computer
            .iter()
            .filter_map(|c| c.monitor_data.disk_space.as_ref())
        {
            if let Some(size) = disk.size {
                total = size;
            }
            if let Some(free_space) = disk.free_space {
                free = free_space;
            }
        }

        let used = total.saturating_sub(free);
        let usage_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_bytes: total,
            free_bytes: free,
            used_bytes: used,
            total_gb: bytes_to_gb(total as f64),
            free_gb: bytes_to_gb(free as f64),
            used_gb: bytes_to_gb(used as f64),
            usage_percent,
            ..Self::default()
        }
    }
}

/// Collects [`DiskReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskCollector;

#[async_trait::async_trait]
impl Collector for DiskCollector {
    type Report = DiskReport;

    fn name(&self) -> &'static str {
        "disk"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<DiskReport, CollectorError> {
        let set: ComputerSet = client.get_json_depth("computer/api/json", 2).await?;
        let mut report = DiskReport::from_computers(&set);

        match client.get_json::<DiskUsagePlugin>("disk-usage/api/json").await {
            Ok(usage) => {
                report.job_disk_usage = usage.jobs_disk_usage;
                report.build_disk_usage = usage.builds_disk_usage;
            }
            Err(e) => tracing::debug!(error = %e, "disk-usage plugin not available"),
        }

        if let Ok(home) = client
            .get_json::<HomeUsage>("disk-usage/jenkinsHomeUsage/api/json")
            .await
        {
            report.jenkins_home_size = home.size;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GB: u64 = 1024 * 1024 * 1024;

    fn computers(disks: serde_json::Value) -> ComputerSet {
        serde_json::from_value(json!({ "computer": disks })).unwrap()
    }

    #[test]
    fn test_from_computers_usage() {
        let set = computers(json!([{
            "displayName": "built-in",
            "monitorData": {
                "hudson.node_monitors.DiskSpaceMonitor": {"size": 100 * GB, "freeSpace": 25 * GB}
            }
        }]));
        let report = DiskReport::from_computers(&set);
        assert_eq!(report.used_bytes, 75 * GB);
        assert!((report.usage_percent - 75.0).abs() < 1e-9);
        assert!((report.free_gb - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_computers_last_reading_wins() {
        let set = computers(json!([
            {"displayName": "a", "monitorData": {"hudson.node_monitors.DiskSpaceMonitor": {"size": 10 * GB, "freeSpace": 5 * GB}}},
            {"displayName": "b", "monitorData": {"hudson.node_monitors.DiskSpaceMonitor": null}},
            {"displayName": "c", "monitorData": {"hudson.node_monitors.DiskSpaceMonitor": {"size": 40 * GB, "freeSpace": 4 * GB}}}
        ]));
        let report = DiskReport::from_computers(&set);
        assert_eq!(report.total_bytes, 40 * GB);
        assert_eq!(report.free_bytes, 4 * GB);
    }

    #[test]
    fn test_from_computers_zero_total() {
        let report = DiskReport::from_computers(&computers(json!([])));
        assert_eq!(report.usage_percent, 0.0);
        assert_eq!(report.total_gb, 0.0);
    }
}
