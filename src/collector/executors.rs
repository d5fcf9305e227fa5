//! Executor utilization per online node.

use std::collections::HashMap;

use crate::api::{ComputerSet, Executable, Executor};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};

/// A build occupying an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningBuild {
    pub job_name: String,
    pub build_number: Option<u64>,
    pub progress: String,
}

/// Job name from a build URL (`.../job/<name>/<n>/`) or, failing that, the
/// text before `#` in the display name.
pub fn job_name_of(executable: &Executable) -> String {
    if let Some(url) = executable.url.as_deref() {
        let parts: Vec<&str> = url.trim_matches('/').split('/').collect();
        if let Some(idx) = parts.iter().position(|p| *p == "job") {
            if let Some(name) = parts.get(idx + 1) {
                return name.to_string();
            }
        }
    }

    executable
        .display_name
        .as_deref()
        .and_then(|d| d.split_once('#'))
        .map(|(name, _)| name.trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn running_build(executor: &Executor) -> Option<RunningBuild> {
    let executable = executor.current_executable.as_ref()?;
    Some(RunningBuild {
        job_name: job_name_of(executable),
        build_number: executable.number,
        progress: match executor.progress {
            Some(p) if p >= 0 => format!("{p}%"),
            _ => "Unknown".to_string(),
        },
    })
}

/// Executor usage of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeExecutors {
    pub node_name: String,
    pub total: usize,
    pub busy: usize,
    pub idle: usize,
    pub utilization: f64,
    /// Job occupying the most executors, empty when idle.
    pub most_running_job: String,
    pub running: Vec<RunningBuild>,
}

impl NodeExecutors {
    pub fn from_executors(node_name: &str, executors: &[Executor]) -> Self {
        let total = executors.len();
        let busy = executors.iter().filter(|e| !e.idle).count();
        let running: Vec<RunningBuild> = executors
            .iter()
            .filter(|e| !e.idle)
            .filter_map(running_build)
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut most_running_job = String::new();
        let mut best = 0;
        for build in &running {
            let count = counts.entry(build.job_name.as_str()).or_default();
            *count += 1;
            if *count > best {
                best = *count;
                most_running_job = build.job_name.clone();
            }
        }

        Self {
            node_name: node_name.to_string(),
            total,
            busy,
            idle: total - busy,
            utilization: if total > 0 {
                busy as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            most_running_job,
            running,
        }
    }
}

/// Executor usage across online nodes, busiest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorsReport {
    pub nodes: Vec<NodeExecutors>,
    pub total_executors: usize,
    pub busy_executors: usize,
    pub idle_executors: usize,
    pub overall_utilization: f64,
}

impl ExecutorsReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut nodes: Vec<NodeExecutors> = set
            .computer
            .iter()
            .filter(|c| !c.offline)
            .map(|c| NodeExecutors::from_executors(&c.display_name, &c.executors))
            .collect();
        nodes.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));

        let total: usize = nodes.iter().map(|n| n.total).sum();
        let busy: usize = nodes.iter().map(|n| n.busy).sum();

        Self {
            nodes,
            total_executors: total,
            busy_executors: busy,
            idle_executors: total - busy,
            overall_utilization: if total > 0 {
                busy as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Collects [`ExecutorsReport`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutorsCollector;

#[async_trait::async_trait]
impl Collector for ExecutorsCollector {
    type Report = ExecutorsReport;

    fn name(&self) -> &'static str {
        "executors"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<ExecutorsReport, CollectorError> {
        let set: ComputerSet = client.get_json_depth("computer/api/json", 2).await?;
        Ok(ExecutorsReport::from_computers(&set))
    }
}
