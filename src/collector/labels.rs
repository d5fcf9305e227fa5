//! Node labels: per-label capacity and which jobs pin to each label.

use std::collections::BTreeMap;

use crate::api::ComputerSet;
use crate::client::JenkinsClient;
use crate::collector::job_config::sample_job_configs;
use crate::collector::{Collector, CollectorError};

/// Jobs whose `config.xml` is scanned for label references.
const DEFAULT_JOB_SAMPLE: usize = 50;

/// Capacity and usage of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStats {
    pub name: String,
    pub node_count: usize,
    pub online_nodes: usize,
    pub offline_nodes: usize,
    pub total_executors: u32,
    pub online_executors: u32,
    /// Jobs referencing this label, in scan order.
    pub jobs: Vec<String>,
}

impl LabelStats {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            node_count: 0,
            online_nodes: 0,
            offline_nodes: 0,
            total_executors: 0,
            online_executors: 0,
            jobs: Vec::new(),
        }
    }

    /// Online executors as a percentage of all executors carrying the label.
    pub fn executor_utilization(&self) -> f64 {
        if self.total_executors == 0 {
            0.0
        } else {
            self.online_executors as f64 / self.total_executors as f64 * 100.0
        }
    }

    /// Online nodes as a percentage of nodes carrying the label.
    pub fn availability(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.online_nodes as f64 / self.node_count as f64 * 100.0
        }
    }
}

/// Membership entry of a node under a label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMember {
    pub name: String,
    pub online: bool,
    pub executors: u32,
}

/// Label distribution and usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelsReport {
    /// Sorted by node count, most first.
    pub labels: Vec<LabelStats>,
    pub nodes_by_label: BTreeMap<String, Vec<LabelMember>>,
    pub labeled_nodes: BTreeMap<String, Vec<String>>,
    pub unlabeled_nodes: Vec<String>,
}

impl LabelsReport {
    pub fn from_computers(set: &ComputerSet) -> Self {
        let mut stats: BTreeMap<String, LabelStats> = BTreeMap::new();
        let mut report = Self::default();

        for computer in &set.computer {
            let labels = computer.labels();
            let online = !computer.offline;
            let executors = computer.num_executors;

            if labels.is_empty() {
                report.unlabeled_nodes.push(computer.display_name.clone());
                continue;
            }

            for label in &labels {
                let entry = stats
                    .entry(label.clone())
                    .or_insert_with(|| LabelStats::new(label));
                entry.node_count += 1;
                entry.total_executors += executors;
                if online {
                    entry.online_nodes += 1;
                    entry.online_executors += executors;
                } else {
                    entry.offline_nodes += 1;
                }

                report
                    .nodes_by_label
                    .entry(label.clone())
                    .or_default()
                    .push(LabelMember {
                        name: computer.display_name.clone(),
                        online,
                        executors,
                    });
            }
            report
                .labeled_nodes
                .insert(computer.display_name.clone(), labels);
        }

        report.labels = stats.into_values().collect();
        report.labels.sort_by(|a, b| b.node_count.cmp(&a.node_count));
        report
    }

    /// Record every label referenced by a job's `config.xml`.
    pub fn scan_job_config(&mut self, job_name: &str, config: &str) {
        for label in &mut self.labels {
            if references_label(config, &label.name) {
                label.jobs.push(job_name.to_string());
            }
        }
    }
}

/// Whether a job configuration pins or mentions `label`.
pub fn references_label(config: &str, label: &str) -> bool {
    config.contains(&format!("<assignedNode>{label}</assignedNode>"))
        || config.contains(&format!("<label>{label}</label>"))
        || config.contains(&format!("'{label}'"))
        || config.contains(&format!("\"{label}\""))
}

/// Collects [`LabelsReport`].
#[derive(Debug, Clone, Copy)]
pub struct LabelsCollector {
    job_sample: usize,
}

impl LabelsCollector {
    pub fn new() -> Self {
        Self {
            job_sample: DEFAULT_JOB_SAMPLE,
        }
    }

    pub fn with_job_sample(mut self, sample: usize) -> Self {
        self.job_sample = sample;
        self
    }
}

impl Default for LabelsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for LabelsCollector {
    type Report = LabelsReport;

    fn name(&self) -> &'static str {
        "labels"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<LabelsReport, CollectorError> {
        let set: ComputerSet = client.get_json_depth("computer/api/json", 2).await?;
        let mut report = LabelsReport::from_computers(&set);

        match sample_job_configs(client, self.job_sample).await {
            Ok(configs) => {
                for config in &configs {
                    report.scan_job_config(&config.name, &config.xml);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch jobs for label usage"),
        }

        Ok(report)
    }
}
