//! Node hardware from the built-in node monitors.

use crate::api::{Computer, ComputerSet};
use crate::client::JenkinsClient;
use crate::client::html::{UNKNOWN, first_capture, static_regex};
use crate::collector::nodes::connection_type;
use crate::collector::{Collector, CollectorError};

/// Hardware readings of one node. `None` means the monitor did not report.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeHardware {
    pub name: String,
    pub online: bool,
    pub connection_type: String,
    /// Parsed from the architecture string, else the executor count.
    pub cpu_cores: Option<u32>,
    pub cpu_load: Option<f64>,
    pub memory_total: Option<u64>,
    pub memory_available: Option<u64>,
    pub disk_total: Option<u64>,
    pub disk_free: Option<u64>,
    pub os_description: String,
    pub response_time_ms: Option<f64>,
}

impl NodeHardware {
    pub fn from_computer(computer: &Computer) -> Self {
        let monitors = &computer.monitor_data;
        let swap = monitors.swap_space.as_ref();
        let disk = monitors.disk_space.as_ref();

        Self {
            name: computer.display_name.clone(),
            online: !computer.offline,
            connection_type: connection_type(computer.class.as_deref()),
            cpu_cores: cpu_cores(computer),
            cpu_load: monitors.system_load.as_ref().and_then(|l| l.load_average),
            memory_total: swap.and_then(|s| s.total_physical_memory),
            memory_available: swap.and_then(|s| s.available_physical_memory),
            disk_total: disk.and_then(|d| d.size),
            disk_free: disk.and_then(|d| d.free_space),
            os_description: os_description(computer),
            response_time_ms: monitors.response_time.as_ref().and_then(|r| r.average),
        }
    }

    pub fn memory_used(&self) -> Option<u64> {
        Some(self.memory_total?.saturating_sub(self.memory_available.unwrap_or(0)))
    }

    pub fn memory_usage_percent(&self) -> Option<f64> {
        usage_percent(self.memory_total?, self.memory_available?)
    }

    pub fn disk_usage_percent(&self) -> Option<f64> {
        usage_percent(self.disk_total?, self.disk_free?)
    }
}

fn usage_percent(total: u64, free: u64) -> Option<f64> {
    (total > 0).then(|| total.saturating_sub(free) as f64 / total as f64 * 100.0)
}

fn cpu_cores(computer: &Computer) -> Option<u32> {
    let from_arch = computer.monitor_data.architecture.as_deref().and_then(|arch| {
        first_capture(static_regex!(r"(?i)(\d+)\s*(?:core|cpu|processor)"), arch)
            .and_then(|n| n.parse().ok())
    });
    from_arch.or((computer.num_executors > 0).then_some(computer.num_executors))
}

fn os_description(computer: &Computer) -> String {
    if let Some(arch) = &computer.monitor_data.architecture {
        return arch.clone();
    }
    match computer.system_info() {
        Some((name, version, arch)) => format!("{name} {version} ({arch})").trim().to_string(),
        None => UNKNOWN.to_string(),
    }
}

/// Totals across nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareSummary {
    pub total_nodes: usize,
    pub online_nodes: usize,
    pub offline_nodes: usize,
    pub total_cpu_cores: u64,
    pub total_memory: u64,
    pub total_disk_space: u64,
}

/// Hardware readings of every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardwareReport {
    pub nodes: Vec<NodeHardware>,
    pub summary: HardwareSummary,
}

impl HardwareReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let nodes: Vec<NodeHardware> = set.computer.iter().map(NodeHardware::from_computer).collect();

        let online_nodes = nodes.iter().filter(|n| n.online).count();
        let summary = HardwareSummary {
            total_nodes: nodes.len(),
            online_nodes,
            offline_nodes: nodes.len() - online_nodes,
            total_cpu_cores: nodes.iter().filter_map(|n| n.cpu_cores).map(u64::from).sum(),
            total_memory: nodes.iter().filter_map(|n| n.memory_total).sum(),
            total_disk_space: nodes.iter().filter_map(|n| n.disk_total).sum(),
        };

        Self { nodes, summary }
    }
}

/// Collects [`HardwareReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareCollector;

#[async_trait::async_trait]
impl Collector for HardwareCollector {
    type Report = HardwareReport;

    fn name(&self) -> &'static str {
        "hardware"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<HardwareReport, CollectorError> {
        let set: ComputerSet = client
            .get_json_depth("computer/api/json", 3)
            .await
            .map_err(|e| CollectorError::context("hardware information", e))?;
        Ok(HardwareReport::from_computers(&set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ComputerSet {
        serde_json::from_value(json!({
            "computer": [
                {
                    "_class": "hudson.model.Hudson$MasterComputer",
                    "displayName": "built-in",
                    "offline": false,
                    "numExecutors": 2,
                    "monitorData": {
                        "hudson.node_monitors.ArchitectureMonitor": "Linux (amd64) 8 cores",
                        "hudson.node_monitors.SwapSpaceMonitor": {
                            "totalPhysicalMemory": 1000, "availablePhysicalMemory": 250
                        },
                        "hudson.node_monitors.DiskSpaceMonitor": {"size": 2000, "freeSpace": 1500},
                        "hudson.node_monitors.ResponseTimeMonitor": {"average": 12.5},
                        "hudson.node_monitors.SystemLoadMonitor": {"loadAverage": 0.75}
                    }
                },
                {
                    "_class": "hudson.slaves.SlaveComputer",
                    "displayName": "agent",
                    "offline": true,
                    "numExecutors": 4,
                    "monitorData": {
                        "hudson.node_monitors.SystemInfo": {"name": "Windows", "version": "10", "arch": "amd64"}
                    }
                },
                {"displayName": "empty", "offline": false}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_node_hardware() {
        let report = HardwareReport::from_computers(&sample());
        let main = &report.nodes[0];
        assert_eq!(main.cpu_cores, Some(8));
        assert_eq!(main.connection_type, "Built-in Node");
        assert_eq!(main.memory_used(), Some(750));
        assert!((main.memory_usage_percent().unwrap() - 75.0).abs() < 1e-9);
        assert!((main.disk_usage_percent().unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(main.cpu_load, Some(0.75));

        let agent = &report.nodes[1];
        assert_eq!(agent.cpu_cores, Some(4));
        assert_eq!(agent.os_description, "Windows 10 (amd64)");
        assert_eq!(agent.memory_usage_percent(), None);

        let empty = &report.nodes[2];
        assert_eq!(empty.cpu_cores, None);
        assert_eq!(empty.os_description, UNKNOWN);
    }

    #[test]
    fn test_summary() {
        let summary = HardwareReport::from_computers(&sample()).summary;
        assert_eq!(summary.total_nodes, 3);
        assert_eq!(summary.online_nodes, 2);
        assert_eq!(summary.offline_nodes, 1);
        assert_eq!(summary.total_cpu_cores, 12);
        assert_eq!(summary.total_memory, 1000);
        assert_eq!(summary.total_disk_space, 2000);
    }
}
