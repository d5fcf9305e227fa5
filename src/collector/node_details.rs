//! OS, hardware and software tables per node.

use crate::api::{Computer, ComputerSet};
use crate::client::JenkinsClient;
use crate::client::html::UNKNOWN;
use crate::collector::nodes::NodeRow;
use crate::collector::{Collector, CollectorError};
use crate::format::format_bytes;

/// Which of the three tables to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTables {
    pub os: bool,
    pub hardware: bool,
    pub software: bool,
}

impl DetailTables {
    pub const ALL: Self = Self {
        os: true,
        hardware: true,
        software: true,
    };
}

impl Default for DetailTables {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeOsDetail {
    pub name: String,
    pub machine_name: String,
    pub ip_address: String,
    pub os_type: String,
    pub os_vendor: String,
    pub os_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeHardwareDetail {
    pub name: String,
    pub vendor: String,
    pub model: String,
    pub kind: String,
    pub serial: String,
    pub cpu: String,
    pub ram: String,
    pub disk: String,
    pub swap: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSoftwareDetail {
    pub name: String,
    pub jdk: String,
    pub agent_version: String,
    pub clock_difference: String,
}

fn bytes_or_unknown(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| UNKNOWN.to_string(), |b| format_bytes(b as f64))
}

/// Detail tables; a table not requested stays empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDetailsReport {
    pub os: Vec<NodeOsDetail>,
    pub hardware: Vec<NodeHardwareDetail>,
    pub software: Vec<NodeSoftwareDetail>,
}

impl NodeDetailsReport {
    pub fn from_computers(set: &ComputerSet, tables: DetailTables) -> Self {
        let mut report = Self::default();
        for computer in &set.computer {
            let row = NodeRow::from_computer(computer);
            if tables.os {
                report.os.push(os_detail(&row));
            }
            if tables.hardware {
                report.hardware.push(hardware_detail(&row, computer));
            }
            if tables.software {
                report.software.push(software_detail(&row, computer));
            }
        }
        report
    }
}

fn os_detail(row: &NodeRow) -> NodeOsDetail {
    NodeOsDetail {
        name: row.name.clone(),
        machine_name: row.name.clone(),
        ip_address: UNKNOWN.to_string(),
        os_type: row.os.name.clone(),
        os_vendor: row.os.name.clone(),
        os_version: row.os.full_name.clone(),
    }
}

fn hardware_detail(row: &NodeRow, computer: &Computer) -> NodeHardwareDetail {
    let swap = computer.monitor_data.swap_space.as_ref();
    NodeHardwareDetail {
        name: row.name.clone(),
        vendor: row.os.name.clone(),
        model: UNKNOWN.to_string(),
        kind: "Physical (assumed)".to_string(),
        serial: UNKNOWN.to_string(),
        cpu: format!("Estimated ~{} cores", row.num_executors.max(1)),
        ram: bytes_or_unknown(swap.and_then(|s| s.total_physical_memory)),
        disk: bytes_or_unknown(row.disk_bytes),
        swap: bytes_or_unknown(swap.and_then(|s| s.total_swap_space)),
    }
}

fn software_detail(row: &NodeRow, computer: &Computer) -> NodeSoftwareDetail {
    NodeSoftwareDetail {
        name: row.name.clone(),
        jdk: row.jvm_version.clone(),
        agent_version: UNKNOWN.to_string(),
        clock_difference: computer
            .monitor_data
            .clock
            .as_ref()
            .and_then(|c| c.diff)
            .map_or_else(|| UNKNOWN.to_string(), |d| format!("{d} ms")),
    }
}

/// Collects [`NodeDetailsReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeDetailsCollector {
    tables: DetailTables,
}

impl NodeDetailsCollector {
    pub fn new(tables: DetailTables) -> Self {
        Self { tables }
    }
}

#[async_trait::async_trait]
impl Collector for NodeDetailsCollector {
    type Report = NodeDetailsReport;

    fn name(&self) -> &'static str {
        "node_details"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<NodeDetailsReport, CollectorError> {
        let set: ComputerSet = client
            .get_json_depth("computer/api/json", 2)
            .await
            .map_err(|e| CollectorError::context("node details", e))?;
        Ok(NodeDetailsReport::from_computers(&set, self.tables))
    }
}
