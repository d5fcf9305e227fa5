//! Threshold alerts.
//!
//! Applies static, configurable limits to a handful of collector reports and
//! returns severity-tagged findings. Every rule is independent: a report that
//! is missing (its collector failed) simply contributes no alerts.

use serde::{Deserialize, Serialize};

use crate::collector::{
    DiskReport, JobsReport, JobsSummaryReport, NodesReport, NodesSummaryReport, PluginsReport,
    QueueReport, SystemReport,
};

// =============================================================================
// Types
// =============================================================================

/// How urgent an alert is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Critical,
    Warning,
}

/// Expected operational impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// Area an alert belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::Display,
)]
pub enum AlertCategory {
    #[strum(serialize = "Disk Space")]
    DiskSpace,
    #[strum(serialize = "Node Status")]
    NodeStatus,
    #[strum(serialize = "Executor Usage")]
    ExecutorUsage,
    #[strum(serialize = "Job Status")]
    JobStatus,
    #[strum(serialize = "Build Success")]
    BuildSuccess,
    #[strum(serialize = "Build Queue")]
    BuildQueue,
    #[strum(serialize = "Plugin Updates")]
    PluginUpdates,
    #[strum(serialize = "Security Updates")]
    SecurityUpdates,
    #[strum(serialize = "Java Version")]
    JavaVersion,
}

impl AlertCategory {
    pub fn icon(self) -> &'static str {
        match self {
            Self::DiskSpace => "💾",
            Self::NodeStatus => "🖥️",
            Self::ExecutorUsage => "⚙️",
            Self::JobStatus => "❌",
            Self::BuildSuccess => "📊",
            Self::BuildQueue => "⏱️",
            Self::PluginUpdates => "🔌",
            Self::SecurityUpdates => "🔒",
            Self::JavaVersion => "☕",
        }
    }
}

/// One threshold-triggered finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub category: AlertCategory,
    pub icon: &'static str,
    pub message: String,
    pub details: String,
    pub impact: Impact,
    pub severity: Severity,
}

impl Alert {
    fn new(
        category: AlertCategory,
        severity: Severity,
        impact: Impact,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            category,
            icon: category.icon(),
            message: message.into(),
            details: details.into(),
            impact,
            severity,
        }
    }

    fn critical(
        category: AlertCategory,
        impact: Impact,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(category, Severity::Critical, impact, message, details)
    }

    fn warning(
        category: AlertCategory,
        impact: Impact,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(category, Severity::Warning, impact, message, details)
    }

    fn with_icon(mut self, icon: &'static str) -> Self {
        self.icon = icon;
        self
    }
}

/// Alerts split by severity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertSummary {
    pub critical_alerts: Vec<Alert>,
    pub warnings: Vec<Alert>,
    pub critical_count: usize,
    pub warning_count: usize,
    pub total_count: usize,
}

impl AlertSummary {
    pub fn from_alerts(alerts: impl IntoIterator<Item = Alert>) -> Self {
        let (critical_alerts, warnings): (Vec<_>, Vec<_>) = alerts
            .into_iter()
            .partition(|a| a.severity == Severity::Critical);
        Self {
            critical_count: critical_alerts.len(),
            warning_count: warnings.len(),
            total_count: critical_alerts.len() + warnings.len(),
            critical_alerts,
            warnings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// All alerts, critical first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.critical_alerts.iter().chain(&self.warnings)
    }
}

// =============================================================================
// Thresholds
// =============================================================================

/// Numeric limits for every rule. Percentages are 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub disk_warning: f64,
    pub disk_critical: f64,
    pub offline_nodes_critical_percent: f64,
    pub executor_utilization_warning: f64,
    pub failed_jobs_critical_percent: f64,
    pub failed_jobs_warning_count: usize,
    pub unstable_jobs_warning_percent: f64,
    pub success_rate_critical: f64,
    pub success_rate_warning: f64,
    pub queue_warning: usize,
    pub queue_critical: usize,
    pub plugin_updates_warning_percent: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            disk_warning: 85.0,
            disk_critical: 95.0,
            offline_nodes_critical_percent: 20.0,
            executor_utilization_warning: 90.0,
            failed_jobs_critical_percent: 25.0,
            failed_jobs_warning_count: 10,
            unstable_jobs_warning_percent: 20.0,
            success_rate_critical: 50.0,
            success_rate_warning: 75.0,
            queue_warning: 10,
            queue_critical: 20,
            plugin_updates_warning_percent: 40.0,
        }
    }
}

impl AlertThresholds {
    /// Percentage thresholds with their config key names.
    pub fn percentages(&self) -> [(&'static str, f64); 9] {
        [
            ("disk_warning", self.disk_warning),
            ("disk_critical", self.disk_critical),
            ("offline_nodes_critical_percent", self.offline_nodes_critical_percent),
            ("executor_utilization_warning", self.executor_utilization_warning),
            ("failed_jobs_critical_percent", self.failed_jobs_critical_percent),
            ("unstable_jobs_warning_percent", self.unstable_jobs_warning_percent),
            ("success_rate_critical", self.success_rate_critical),
            ("success_rate_warning", self.success_rate_warning),
            ("plugin_updates_warning_percent", self.plugin_updates_warning_percent),
        ]
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Node figures used by the node and executor rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeMetrics {
    pub total_nodes: usize,
    pub offline: usize,
    pub temp_offline: usize,
    pub busy_executors: u32,
    pub total_executors: u32,
}

impl From<&NodesReport> for NodeMetrics {
    fn from(report: &NodesReport) -> Self {
        Self {
            total_nodes: report.nodes.len(),
            offline: report.status_counts.offline,
            temp_offline: report.status_counts.temp_offline,
            busy_executors: report.busy_executors,
            total_executors: report.total_executors,
        }
    }
}

impl From<&NodesSummaryReport> for NodeMetrics {
    fn from(report: &NodesSummaryReport) -> Self {
        Self {
            total_nodes: report.total_nodes,
            offline: report.status.offline,
            temp_offline: report.status.temp_offline,
            busy_executors: report.busy_executors,
            total_executors: report.total_executors,
        }
    }
}

/// Job figures used by the job and success-rate rules.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JobMetrics {
    pub total: usize,
    pub failed: usize,
    pub unstable: usize,
    pub success_rate: f64,
}

impl From<&JobsReport> for JobMetrics {
    fn from(report: &JobsReport) -> Self {
        Self {
            total: report.total_jobs,
            failed: report.status_counts.failed,
            unstable: report.status_counts.unstable,
            success_rate: report.success_rate,
        }
    }
}

impl From<&JobsSummaryReport> for JobMetrics {
    fn from(report: &JobsSummaryReport) -> Self {
        Self {
            total: report.total,
            failed: report.status.failed,
            unstable: report.status.unstable,
            success_rate: report.success_rate,
        }
    }
}

/// Reports available to [`evaluate`]. `None` skips that area.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertInputs<'a> {
    pub disk: Option<&'a DiskReport>,
    pub nodes: Option<NodeMetrics>,
    pub jobs: Option<JobMetrics>,
    pub queue: Option<&'a QueueReport>,
    pub plugins: Option<&'a PluginsReport>,
    pub system: Option<&'a SystemReport>,
}

// =============================================================================
// Rules
// =============================================================================

fn percent(part: f64, whole: f64) -> Option<f64> {
    (whole > 0.0).then(|| part / whole * 100.0)
}

pub fn classify_disk(disk: &DiskReport, t: &AlertThresholds) -> Vec<Alert> {
    let usage = disk.usage_percent;
    let details = format!("Free space: {:.2} GB", disk.free_gb);
    if usage >= t.disk_critical {
        vec![Alert::critical(
            AlertCategory::DiskSpace,
            Impact::High,
            format!("CRITICAL: Disk usage at {usage:.1}% - Immediate cleanup required"),
            details,
        )]
    } else if usage >= t.disk_warning {
        vec![Alert::warning(
            AlertCategory::DiskSpace,
            Impact::Medium,
            format!("WARNING: Disk usage high at {usage:.1}%"),
            details,
        )]
    } else {
        Vec::new()
    }
}

pub fn classify_nodes(nodes: &NodeMetrics, t: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if nodes.offline > 0 {
        let offline_pct = percent(nodes.offline as f64, nodes.total_nodes as f64).unwrap_or(0.0);
        alerts.push(if offline_pct >= t.offline_nodes_critical_percent {
            Alert::critical(
                AlertCategory::NodeStatus,
                Impact::High,
                format!(
                    "CRITICAL: {} nodes offline ({offline_pct:.1}% of total)",
                    nodes.offline
                ),
                "Check node connectivity issues",
            )
        } else {
            Alert::warning(
                AlertCategory::NodeStatus,
                Impact::Medium,
                format!("WARNING: {} nodes offline", nodes.offline),
                "Check node connectivity issues",
            )
        });
    }

    if nodes.temp_offline > 0 {
        alerts.push(Alert::warning(
            AlertCategory::NodeStatus,
            Impact::Low,
            format!("WARNING: {} nodes temporarily offline", nodes.temp_offline),
            "Check if maintenance is in progress",
        ));
    }

    if let Some(utilization) = percent(
        f64::from(nodes.busy_executors),
        f64::from(nodes.total_executors),
    ) {
        if utilization >= t.executor_utilization_warning {
            alerts.push(Alert::warning(
                AlertCategory::ExecutorUsage,
                Impact::Medium,
                format!("WARNING: High executor utilization ({utilization:.1}%)"),
                "Consider adding more executors or optimizing builds",
            ));
        }
    }

    alerts
}

/// Job status and success-rate rules.
///
/// Shares are 0 when there are no jobs, so an empty instance still reports
/// its 0% success rate as critical.
pub fn classify_jobs(jobs: &JobMetrics, t: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if jobs.failed > 0 {
        let failed_pct = percent(jobs.failed as f64, jobs.total as f64).unwrap_or(0.0);
        if failed_pct >= t.failed_jobs_critical_percent {
            alerts.push(Alert::critical(
                AlertCategory::JobStatus,
                Impact::High,
                format!(
                    "CRITICAL: {} failed jobs ({failed_pct:.1}% of total)",
                    jobs.failed
                ),
                "Check console logs for error patterns",
            ));
        } else if jobs.failed >= t.failed_jobs_warning_count {
            alerts.push(Alert::warning(
                AlertCategory::JobStatus,
                Impact::Medium,
                format!("WARNING: {} failed jobs", jobs.failed),
                "Review build logs for common issues",
            ));
        }
    }

    let unstable_pct = percent(jobs.unstable as f64, jobs.total as f64).unwrap_or(0.0);
    if jobs.unstable > 0 && unstable_pct >= t.unstable_jobs_warning_percent {
        alerts.push(
            Alert::warning(
                AlertCategory::JobStatus,
                Impact::Medium,
                format!(
                    "WARNING: {} unstable jobs ({unstable_pct:.1}% of total)",
                    jobs.unstable
                ),
                "Check tests for flakiness",
            )
            .with_icon("⚠️"),
        );
    }

    let rate = jobs.success_rate;
    if rate <= t.success_rate_critical {
        alerts.push(Alert::critical(
            AlertCategory::BuildSuccess,
            Impact::High,
            format!("CRITICAL: Low build success rate ({rate:.1}%)"),
            "Major build reliability issues",
        ));
    } else if rate <= t.success_rate_warning {
        alerts.push(Alert::warning(
            AlertCategory::BuildSuccess,
            Impact::Medium,
            format!("WARNING: Moderate build success rate ({rate:.1}%)"),
            "Build reliability issues",
        ));
    }

    alerts
}

pub fn classify_queue(queue: &QueueReport, t: &AlertThresholds) -> Vec<Alert> {
    let items = queue.items_in_queue;
    if items >= t.queue_critical {
        vec![Alert::critical(
            AlertCategory::BuildQueue,
            Impact::High,
            format!("CRITICAL: {items} items in queue"),
            "Severe build backlog, check executor availability",
        )]
    } else if items >= t.queue_warning {
        vec![Alert::warning(
            AlertCategory::BuildQueue,
            Impact::Medium,
            format!("WARNING: {items} items in queue"),
            "Build backlog forming, check executor availability",
        )]
    } else {
        Vec::new()
    }
}

pub fn classify_plugins(plugins: &PluginsReport, t: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if plugins.updates_available > 0 {
        let pct = percent(
            plugins.updates_available as f64,
            plugins.total_plugins as f64,
        );
        if let Some(pct) = pct.filter(|p| *p >= t.plugin_updates_warning_percent) {
            alerts.push(Alert::warning(
                AlertCategory::PluginUpdates,
                Impact::Low,
                format!(
                    "WARNING: {} plugins need updates ({pct:.1}% of total)",
                    plugins.updates_available
                ),
                "Schedule a maintenance window to update plugins",
            ));
        }
    }

    let security = plugins.security_updates().len();
    if security > 0 {
        alerts.push(Alert::critical(
            AlertCategory::SecurityUpdates,
            Impact::High,
            format!("CRITICAL: {security} security-related plugins need updates"),
            "Security vulnerabilities may exist, update immediately",
        ));
    }

    alerts
}

/// Java runtime age. Java 6 and 7 are critical, Java 8 a warning.
pub fn classify_java(java_version: &str) -> Vec<Alert> {
    if java_version.contains("1.7") || java_version.contains("1.6") {
        vec![Alert::critical(
            AlertCategory::JavaVersion,
            Impact::High,
            format!("CRITICAL: Using outdated Java version ({java_version})"),
            "Upgrade to at least Java 11 immediately for security and compatibility",
        )]
    } else if java_version.contains("1.8") {
        vec![Alert::warning(
            AlertCategory::JavaVersion,
            Impact::Low,
            format!("WARNING: Using Java 8 ({java_version})"),
            "Consider upgrading to Java 11 or newer for better security and performance",
        )]
    } else {
        Vec::new()
    }
}

/// Run every rule whose input is present.
pub fn evaluate(inputs: &AlertInputs<'_>, thresholds: &AlertThresholds) -> AlertSummary {
    let mut alerts = Vec::new();
    if let Some(disk) = inputs.disk {
        alerts.extend(classify_disk(disk, thresholds));
    }
    if let Some(nodes) = &inputs.nodes {
        alerts.extend(classify_nodes(nodes, thresholds));
    }
    if let Some(jobs) = &inputs.jobs {
        alerts.extend(classify_jobs(jobs, thresholds));
    }
    if let Some(queue) = inputs.queue {
        alerts.extend(classify_queue(queue, thresholds));
    }
    if let Some(plugins) = inputs.plugins {
        alerts.extend(classify_plugins(plugins, thresholds));
    }
    if let Some(system) = inputs.system {
        alerts.extend(classify_java(&system.java_version));
    }
    tracing::debug!(count = alerts.len(), "Alerts evaluated");
    AlertSummary::from_alerts(alerts)
}

/// Suggested action for a category, as `(label, text)`.
pub fn recommendation(category: AlertCategory) -> (&'static str, &'static str) {
    match category {
        AlertCategory::DiskSpace => (
            "Disk Space",
            "Run cleanup on Jenkins workspace and build artifacts",
        ),
        AlertCategory::NodeStatus => ("Node Status", "Check node connectivity and agent logs"),
        AlertCategory::JobStatus | AlertCategory::BuildSuccess => (
            "Job Status",
            "Investigate failed builds and fix underlying issues",
        ),
        AlertCategory::BuildQueue => (
            "Build Queue",
            "Consider adding more executors or optimizing build times",
        ),
        AlertCategory::PluginUpdates | AlertCategory::SecurityUpdates => (
            "Plugin Updates",
            "Schedule a maintenance window to update plugins",
        ),
        AlertCategory::JavaVersion => ("Java Version", "Plan an upgrade to a newer Java version"),
        AlertCategory::ExecutorUsage => (
            "Executor Usage",
            "Add more executors or optimize build schedules",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::plugins::PluginUpdate;

    fn disk(usage: f64) -> DiskReport {
        DiskReport {
            usage_percent: usage,
            free_gb: 12.345,
            ..DiskReport::default()
        }
    }

    fn jobs(total: usize, failed: usize, unstable: usize, success_rate: f64) -> JobMetrics {
        JobMetrics {
            total,
            failed,
            unstable,
            success_rate,
        }
    }

    // =========================================================================
    // Disk
    // =========================================================================

    #[test]
    fn test_disk_levels() {
        let t = AlertThresholds::default();

        let critical = classify_disk(&disk(96.0), &t);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].severity, Severity::Critical);
        assert_eq!(
            critical[0].message,
            "CRITICAL: Disk usage at 96.0% - Immediate cleanup required"
        );
        assert_eq!(critical[0].details, "Free space: 12.35 GB");
        assert_eq!(critical[0].impact, Impact::High);

        let warning = classify_disk(&disk(90.0), &t);
        assert_eq!(warning[0].severity, Severity::Warning);
        assert_eq!(warning[0].message, "WARNING: Disk usage high at 90.0%");

        assert!(classify_disk(&disk(80.0), &t).is_empty());
    }

    #[test]
    fn test_disk_monotonic() {
        let t = AlertThresholds::default();
        let rank = |usage: f64| match classify_disk(&disk(usage), &t).first() {
            None => 0,
            Some(a) if a.severity == Severity::Warning => 1,
            Some(_) => 2,
        };
        let ranks: Vec<_> = (0..=100).map(|u| rank(f64::from(u))).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    #[test]
    fn test_nodes_offline_critical() {
        let metrics = NodeMetrics {
            total_nodes: 5,
            offline: 1,
            ..NodeMetrics::default()
        };
        let alerts = classify_nodes(&metrics, &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "CRITICAL: 1 nodes offline (20.0% of total)");
        assert_eq!(alerts[0].details, "Check node connectivity issues");
    }

    #[test]
    fn test_nodes_offline_warning_and_temp() {
        let metrics = NodeMetrics {
            total_nodes: 10,
            offline: 1,
            temp_offline: 2,
            busy_executors: 9,
            total_executors: 10,
        };
        let alerts = classify_nodes(&metrics, &AlertThresholds::default());
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].message, "WARNING: 1 nodes offline");
        assert_eq!(alerts[0].impact, Impact::Medium);
        assert_eq!(alerts[1].message, "WARNING: 2 nodes temporarily offline");
        assert_eq!(alerts[1].impact, Impact::Low);
        assert_eq!(alerts[2].category, AlertCategory::ExecutorUsage);
        assert_eq!(alerts[2].message, "WARNING: High executor utilization (90.0%)");
    }

    #[test]
    fn test_nodes_no_executors() {
        let metrics = NodeMetrics {
            total_nodes: 1,
            ..NodeMetrics::default()
        };
        assert!(classify_nodes(&metrics, &AlertThresholds::default()).is_empty());
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    #[test]
    fn test_jobs_failed_critical() {
        let alerts = classify_jobs(&jobs(8, 2, 0, 75.0), &AlertThresholds::default());
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].message, "CRITICAL: 2 failed jobs (25.0% of total)");
        assert_eq!(alerts[1].message, "WARNING: Moderate build success rate (75.0%)");
    }

    #[test]
    fn test_jobs_failed_count_warning() {
        let alerts = classify_jobs(&jobs(100, 10, 0, 90.0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].message, "WARNING: 10 failed jobs");

        assert!(classify_jobs(&jobs(100, 9, 0, 91.0), &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn test_jobs_unstable_and_low_rate() {
        let alerts = classify_jobs(&jobs(10, 0, 2, 50.0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].message, "WARNING: 2 unstable jobs (20.0% of total)");
        assert_eq!(alerts[0].icon, "⚠️");
        assert_eq!(alerts[1].category, AlertCategory::BuildSuccess);
        assert_eq!(alerts[1].severity, Severity::Critical);
        assert_eq!(alerts[1].message, "CRITICAL: Low build success rate (50.0%)");
    }

    #[test]
    fn test_jobs_empty_instance_flags_zero_rate() {
        let alerts = classify_jobs(&jobs(0, 0, 0, 0.0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, AlertCategory::BuildSuccess);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert!(alerts[0].message.contains("(0.0%)"));
    }

    #[test]
    fn test_jobs_failed_without_total_is_not_a_share() {
        // A failed count with no total falls through to the count rule.
        let alerts = classify_jobs(&jobs(0, 12, 0, 80.0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].message.contains("12 failed jobs"));
    }

    // =========================================================================
    // Queue, plugins, Java
    // =========================================================================

    #[test]
    fn test_queue_levels() {
        let t = AlertThresholds::default();
        let queue = |n| QueueReport {
            items_in_queue: n,
            ..QueueReport::default()
        };
        assert_eq!(classify_queue(&queue(20), &t)[0].severity, Severity::Critical);
        assert_eq!(classify_queue(&queue(12), &t)[0].message, "WARNING: 12 items in queue");
        assert!(classify_queue(&queue(9), &t).is_empty());
    }

    #[test]
    fn test_plugins() {
        let update = |short: &str| PluginUpdate {
            short_name: short.to_string(),
            name: short.to_string(),
            current_version: "1.0".to_string(),
            new_version: "2.0".to_string(),
        };
        let report = PluginsReport {
            total_plugins: 5,
            updates_available: 2,
            update_list: vec![update("git"), update("matrix-auth-security")],
            ..PluginsReport::default()
        };
        let alerts = classify_plugins(&report, &AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            alerts[0].message,
            "WARNING: 2 plugins need updates (40.0% of total)"
        );
        assert_eq!(alerts[1].category, AlertCategory::SecurityUpdates);
        assert_eq!(
            alerts[1].message,
            "CRITICAL: 1 security-related plugins need updates"
        );
    }

    #[test]
    fn test_java_versions() {
        assert_eq!(classify_java("1.7.0_80")[0].severity, Severity::Critical);
        assert_eq!(classify_java("1.6.0")[0].severity, Severity::Critical);
        let java8 = classify_java("1.8.0_392");
        assert_eq!(java8[0].severity, Severity::Warning);
        assert_eq!(java8[0].message, "WARNING: Using Java 8 (1.8.0_392)");
        assert!(classify_java("17.0.9").is_empty());
    }

    // =========================================================================
    // Evaluate
    // =========================================================================

    #[test]
    fn test_evaluate_skips_missing_inputs() {
        let d = disk(99.0);
        let inputs = AlertInputs {
            disk: Some(&d),
            ..AlertInputs::default()
        };
        let summary = evaluate(&inputs, &AlertThresholds::default());
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.warning_count, 0);
        assert_eq!(summary.total_count, 1);

        let empty = evaluate(&AlertInputs::default(), &AlertThresholds::default());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_evaluate_custom_thresholds() {
        let d = disk(70.0);
        let inputs = AlertInputs {
            disk: Some(&d),
            ..AlertInputs::default()
        };
        let thresholds = AlertThresholds {
            disk_warning: 60.0,
            ..AlertThresholds::default()
        };
        let summary = evaluate(&inputs, &thresholds);
        assert_eq!(summary.warning_count, 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(Impact::Medium.to_string(), "MEDIUM");
        assert_eq!(AlertCategory::BuildQueue.to_string(), "Build Queue");
        assert_eq!(recommendation(AlertCategory::SecurityUpdates).0, "Plugin Updates");
    }
}
