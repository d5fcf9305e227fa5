//! Dashboard Runs
//!
//! Drives collectors and renderers for one CLI invocation. Three run modes:
//!
//! - [`RunMode::Overview`]: a fixed set of summaries followed by health alerts
//! - [`RunMode::All`]: every section, grouped under titled banners
//! - [`RunMode::Selected`]: only the sections picked on the command line,
//!   always in [`Section`] order
//!
//! Every section is best-effort. A collector error is logged, rendered as
//! `Error: <message>` in place of the section, and the run moves on.

use std::collections::BTreeSet;
use std::io::{self, Write};

use crate::alerts::{AlertInputs, AlertThresholds, JobMetrics, NodeMetrics, evaluate};
use crate::client::JenkinsClient;
use crate::collector::{
    ArtifactsCollector, BuildStatsCollector, Collector, CollectorError, DetailTables,
    DiskCollector, EmailCollector, ExecutorsCollector, FailedJobsCollector, HardwareCollector,
    InfoCollector, JobTypesCollector, JobsCollector, JobsReport, JobsSummaryCollector,
    LabelsCollector, NodeDetailsCollector, NodesCollector, NodesSummaryCollector,
    NotificationsCollector, OsDetailCollector, PluginsCollector, QueueCollector,
    SecurityCollector, SystemCollector, ToolsCollector, UsersCollector,
};
use crate::config::LimitsConfig;
use crate::display::{self, DisplayOptions, render_error};
use crate::format::format_header;

/// Recent builds listed under the jobs section.
const RECENT_BUILDS_SHOWN: usize = 10;

/// Sections selectable from the command line, in display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::EnumIter,
)]
pub enum Section {
    Info,
    System,
    Jobs,
    Nodes,
    NodeDetails,
    Plugins,
    Queue,
    Disk,
    Hardware,
    Os,
    OsSummary,
    Labels,
    Executors,
    BuildStats,
    FailedJobs,
    Security,
    Artifacts,
    Users,
    Email,
    Tools,
    Notifications,
    Alerts,
}

impl Section {
    /// Banner printed above the section.
    pub fn title(self) -> &'static str {
        match self {
            Self::Info => "JENKINS INFORMATION",
            Self::System => "JENKINS SYSTEM INFORMATION",
            Self::Jobs => "JENKINS JOBS INFORMATION",
            Self::Nodes => "JENKINS NODES INFORMATION",
            Self::NodeDetails => "JENKINS NODES DETAILED INFORMATION",
            Self::Plugins => "JENKINS PLUGINS INFORMATION",
            Self::Queue => "JENKINS QUEUE INFORMATION",
            Self::Disk => "JENKINS DISK USAGE INFORMATION",
            Self::Hardware => "JENKINS HARDWARE INFORMATION",
            Self::Os => "JENKINS OS INFORMATION",
            Self::OsSummary => "JENKINS OS DISTRIBUTION SUMMARY",
            Self::Labels => "JENKINS LABELS INFORMATION",
            Self::Executors => "JENKINS EXECUTOR USAGE INFORMATION",
            Self::BuildStats => "JENKINS BUILD STATISTICS",
            Self::FailedJobs => "JENKINS FAILED JOBS",
            Self::Security => "JENKINS SECURITY CONFIGURATION",
            Self::Artifacts => "JENKINS BUILD ARTIFACTS",
            Self::Users => "JENKINS USERS AND PERMISSIONS",
            Self::Email => "JENKINS EMAIL NOTIFICATION SETTINGS",
            Self::Tools => "JENKINS TOOLS CONFIGURATION",
            Self::Notifications => "JENKINS NOTIFICATION SYSTEMS",
            Self::Alerts => "JENKINS ALERTS AND WARNINGS",
        }
    }
}

/// Sections picked on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    sections: BTreeSet<Section>,
    node_tables: Option<DetailTables>,
    users: bool,
    ldap: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section. [`Section::NodeDetails`] selects all three node tables.
    pub fn add(&mut self, section: Section) -> &mut Self {
        match section {
            Section::NodeDetails => return self.add_node_tables(DetailTables::ALL),
            Section::Users => self.users = true,
            _ => {}
        }
        self.sections.insert(section);
        self
    }

    /// Add some of the node detail tables; repeated calls accumulate.
    pub fn add_node_tables(&mut self, tables: DetailTables) -> &mut Self {
        let merged = match self.node_tables {
            Some(current) => DetailTables {
                os: current.os || tables.os,
                hardware: current.hardware || tables.hardware,
                software: current.software || tables.software,
            },
            None => tables,
        };
        self.node_tables = Some(merged);
        self.sections.insert(Section::NodeDetails);
        self
    }

    /// LDAP settings, shown under the users banner.
    pub fn add_ldap(&mut self) -> &mut Self {
        self.ldap = true;
        self.sections.insert(Section::Users);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Selected sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections.iter().copied()
    }

    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }
}

/// What a run prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Overview,
    All,
    Selected(Selection),
}

impl From<Selection> for RunMode {
    /// An empty selection falls back to the overview.
    fn from(selection: Selection) -> Self {
        if selection.is_empty() {
            Self::Overview
        } else {
            Self::Selected(selection)
        }
    }
}

/// Runs collectors against one server and writes rendered sections to `out`.
pub struct Dashboard<'a, W> {
    client: &'a JenkinsClient,
    out: W,
    limits: LimitsConfig,
    thresholds: AlertThresholds,
    display: DisplayOptions,
}

impl<'a, W: Write> Dashboard<'a, W> {
    pub fn new(client: &'a JenkinsClient, out: W) -> Self {
        Self {
            client,
            out,
            limits: LimitsConfig::default(),
            thresholds: AlertThresholds::default(),
            display: DisplayOptions::default(),
        }
    }

    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    /// Give back the writer, e.g. to inspect a buffered run.
    pub fn into_inner(self) -> W {
        self.out
    }

    pub async fn run(&mut self, mode: &RunMode) -> io::Result<()> {
        match mode {
            RunMode::Overview => self.overview().await,
            RunMode::All => self.comprehensive().await,
            RunMode::Selected(selection) => {
                for section in selection.sections() {
                    self.banner(section.title())?;
                    self.section(section, selection).await?;
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn emit(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{text}")
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        self.emit(&format_header(title))
    }

    /// Render a report, or the error in its place.
    fn show<R>(
        &mut self,
        result: &Result<R, CollectorError>,
        render: impl FnOnce(&R) -> String,
    ) -> io::Result<()> {
        match result {
            Ok(report) => self.emit(&render(report)),
            Err(err) => self.emit(&render_error(err)),
        }
    }

    async fn fetch<C: Collector>(&self, collector: C) -> Result<C::Report, CollectorError> {
        tracing::debug!(collector = collector.name(), "Collecting");
        let result = collector.collect(self.client).await;
        if let Err(e) = &result {
            tracing::warn!(collector = collector.name(), error = %e, "Collection failed");
        }
        result
    }

    fn health(&mut self, inputs: &AlertInputs<'_>) -> io::Result<()> {
        let summary = evaluate(inputs, &self.thresholds);
        self.emit(&display::render_alerts(&summary))
    }

    // =========================================================================
    // Run modes
    // =========================================================================

    async fn overview(&mut self) -> io::Result<()> {
        let opts = self.display;
        self.banner("JENKINS DASHBOARD OVERVIEW")?;

        let system = self.fetch(SystemCollector).await;
        self.show(&system, display::render_system)?;

        let jobs = self
            .fetch(JobsSummaryCollector::new().with_type_sample(self.limits.job_type_sample))
            .await;
        self.show(&jobs, display::render_jobs_summary)?;

        let nodes = self.fetch(NodesSummaryCollector).await;
        self.show(&nodes, display::render_nodes_summary)?;

        let queue = self
            .fetch(QueueCollector::new().with_item_limit(self.limits.queue_items))
            .await;
        self.show(&queue, display::render_queue)?;

        let plugins = self.fetch(PluginsCollector).await;
        self.show(&plugins, display::render_plugins)?;

        let disk = self.fetch(DiskCollector).await;
        self.show(&disk, display::render_disk)?;

        let hardware = self.fetch(HardwareCollector).await;
        self.show(&hardware, |r| display::render_hardware(r, &opts))?;

        let users = self.fetch(UsersCollector).await;
        self.show(&users, |r| display::render_users(r, &opts))?;

        self.os_distribution(false).await?;

        let failed = self
            .fetch(FailedJobsCollector::new(self.limits.failed_jobs))
            .await;
        self.show(&failed, display::render_failed_jobs)?;

        let inputs = AlertInputs {
            disk: disk.as_ref().ok(),
            nodes: nodes.as_ref().ok().map(NodeMetrics::from),
            jobs: jobs.as_ref().ok().map(JobMetrics::from),
            queue: queue.as_ref().ok(),
            plugins: plugins.as_ref().ok(),
            system: system.as_ref().ok(),
        };
        self.health(&inputs)?;

        self.banner("JENKINS DASHBOARD OVERVIEW END")
    }

    async fn comprehensive(&mut self) -> io::Result<()> {
        let opts = self.display;
        self.banner("COMPREHENSIVE JENKINS DASHBOARD")?;

        self.banner("SYSTEM INFORMATION")?;
        let system = self.fetch(SystemCollector).await;
        self.show(&system, display::render_system)?;
        let info = self.fetch(InfoCollector).await;
        self.show(&info, display::render_info)?;
        let security = self.fetch(SecurityCollector).await;
        self.show(&security, display::render_security)?;
        let users = self.fetch(UsersCollector).await;
        self.show(&users, |r| display::render_users(r, &opts))?;
        self.show(&users, display::render_ldap)?;

        self.banner("JOBS INFORMATION")?;
        let summary = self
            .fetch(JobsSummaryCollector::new().with_type_sample(self.limits.job_type_sample))
            .await;
        self.show(&summary, display::render_jobs_summary)?;
        let jobs = self.jobs_details().await?;
        let failed = self
            .fetch(FailedJobsCollector::new(self.limits.failed_jobs))
            .await;
        self.show(&failed, display::render_failed_jobs)?;
        let stats = self
            .fetch(BuildStatsCollector::new(self.limits.build_stats))
            .await;
        self.show(&stats, display::render_build_stats)?;
        let artifacts = self
            .fetch(ArtifactsCollector::new(self.limits.artifacts))
            .await;
        self.show(&artifacts, display::render_artifacts)?;

        self.banner("NODES INFORMATION")?;
        let nodes_summary = self.fetch(NodesSummaryCollector).await;
        self.show(&nodes_summary, display::render_nodes_summary)?;
        let nodes = self.fetch(NodesCollector).await;
        self.show(&nodes, |r| display::render_nodes_overview(r, &opts))?;

        self.banner("NODES DETAILED INFORMATION")?;
        let details = self.fetch(NodeDetailsCollector::new(DetailTables::ALL)).await;
        self.show(&details, display::render_node_details)?;
        self.os_details().await?;
        self.show(&nodes, |r| display::render_labels_distribution(r, &opts))?;
        self.labels().await?;
        let executors = self.fetch(ExecutorsCollector).await;
        self.show(&executors, display::render_executors)?;
        let hardware = self.fetch(HardwareCollector).await;
        self.show(&hardware, |r| display::render_hardware(r, &opts))?;

        self.banner("INFRASTRUCTURE INFORMATION")?;
        let plugins = self.fetch(PluginsCollector).await;
        self.show(&plugins, display::render_plugins)?;
        let queue = self
            .fetch(QueueCollector::new().with_item_limit(self.limits.queue_items))
            .await;
        self.show(&queue, display::render_queue)?;
        let disk = self.fetch(DiskCollector).await;
        self.show(&disk, display::render_disk)?;
        let tools = self
            .fetch(ToolsCollector::new().with_job_sample(self.limits.config_sample))
            .await;
        self.show(&tools, display::render_tools)?;

        self.banner("CONFIGURATION INFORMATION")?;
        let email = self
            .fetch(EmailCollector::new().with_job_sample(self.limits.config_sample))
            .await;
        self.show(&email, display::render_email)?;
        let notifications = self
            .fetch(NotificationsCollector::new().with_job_sample(self.limits.config_sample))
            .await;
        self.show(&notifications, display::render_notifications)?;

        self.banner("ALERTS AND WARNINGS")?;
        // Prefer the full job listing, fall back to the summary.
        let job_metrics = jobs
            .as_ref()
            .ok()
            .map(JobMetrics::from)
            .or_else(|| summary.as_ref().ok().map(JobMetrics::from));
        let inputs = AlertInputs {
            disk: disk.as_ref().ok(),
            nodes: nodes.as_ref().ok().map(NodeMetrics::from),
            jobs: job_metrics,
            queue: queue.as_ref().ok(),
            plugins: plugins.as_ref().ok(),
            system: system.as_ref().ok(),
        };
        self.health(&inputs)?;

        self.banner("COMPREHENSIVE JENKINS DASHBOARD END")
    }

    async fn section(&mut self, section: Section, selection: &Selection) -> io::Result<()> {
        let opts = self.display;
        match section {
            Section::Info => {
                let info = self.fetch(InfoCollector).await;
                self.show(&info, display::render_info)
            }
            Section::System => {
                let system = self.fetch(SystemCollector).await;
                self.show(&system, display::render_system)
            }
            Section::Jobs => {
                let summary = self
                    .fetch(JobsSummaryCollector::new().with_type_sample(self.limits.job_type_sample))
                    .await;
                self.show(&summary, display::render_jobs_summary)?;
                self.jobs_details().await.map(drop)
            }
            Section::Nodes => {
                let summary = self.fetch(NodesSummaryCollector).await;
                self.show(&summary, display::render_nodes_summary)?;
                let nodes = self.fetch(NodesCollector).await;
                self.show(&nodes, |r| display::render_nodes_overview(r, &opts))?;
                self.show(&nodes, |r| display::render_labels_distribution(r, &opts))?;
                self.show(&nodes, display::render_detailed_os_distribution)
            }
            Section::NodeDetails => {
                let tables = selection.node_tables.unwrap_or(DetailTables::ALL);
                let details = self.fetch(NodeDetailsCollector::new(tables)).await;
                self.show(&details, display::render_node_details)
            }
            Section::Plugins => {
                let plugins = self.fetch(PluginsCollector).await;
                self.show(&plugins, display::render_plugins)
            }
            Section::Queue => {
                let queue = self
                    .fetch(QueueCollector::new().with_item_limit(self.limits.queue_items))
                    .await;
                self.show(&queue, display::render_queue)
            }
            Section::Disk => {
                let disk = self.fetch(DiskCollector).await;
                self.show(&disk, display::render_disk)
            }
            Section::Hardware => {
                let hardware = self.fetch(HardwareCollector).await;
                self.show(&hardware, |r| display::render_hardware(r, &opts))
            }
            Section::Os => self.os_details().await,
            Section::OsSummary => {
                let nodes = self.fetch(NodesCollector).await;
                self.show(&nodes, display::render_os_summary)
            }
            Section::Labels => self.labels().await,
            Section::Executors => {
                let executors = self.fetch(ExecutorsCollector).await;
                self.show(&executors, display::render_executors)
            }
            Section::BuildStats => {
                let stats = self
                    .fetch(BuildStatsCollector::new(self.limits.build_stats))
                    .await;
                self.show(&stats, display::render_build_stats)
            }
            Section::FailedJobs => {
                let failed = self
                    .fetch(FailedJobsCollector::new(self.limits.failed_jobs))
                    .await;
                self.show(&failed, display::render_failed_jobs)
            }
            Section::Security => {
                let security = self.fetch(SecurityCollector).await;
                self.show(&security, display::render_security)
            }
            Section::Artifacts => {
                let artifacts = self
                    .fetch(ArtifactsCollector::new(self.limits.artifacts))
                    .await;
                self.show(&artifacts, display::render_artifacts)
            }
            Section::Users => {
                let users = self.fetch(UsersCollector).await;
                if selection.users {
                    self.show(&users, |r| display::render_users(r, &opts))?;
                }
                if selection.ldap {
                    self.show(&users, display::render_ldap)?;
                }
                Ok(())
            }
            Section::Email => {
                let email = self
                    .fetch(EmailCollector::new().with_job_sample(self.limits.config_sample))
                    .await;
                self.show(&email, display::render_email)
            }
            Section::Tools => {
                let tools = self
                    .fetch(ToolsCollector::new().with_job_sample(self.limits.config_sample))
                    .await;
                self.show(&tools, display::render_tools)
            }
            Section::Notifications => {
                let notifications = self
                    .fetch(NotificationsCollector::new().with_job_sample(self.limits.config_sample))
                    .await;
                self.show(&notifications, display::render_notifications)
            }
            Section::Alerts => self.alerts().await,
        }
    }

    // =========================================================================
    // Composite sections
    // =========================================================================

    /// Jobs overview, job types and recent builds. Returns the overview for reuse.
    async fn jobs_details(
        &mut self,
    ) -> io::Result<Result<JobsReport, CollectorError>> {
        let opts = self.display;
        let jobs = self
            .fetch(JobsCollector::new().with_recent_limit(self.limits.recent_builds))
            .await;
        self.show(&jobs, |r| display::render_jobs_overview(r, &opts))?;

        let types = self
            .fetch(JobTypesCollector::new(self.limits.job_type_sample))
            .await;
        self.show(&types, display::render_job_types)?;

        self.show(&jobs, |r| {
            let shown = r.recent_builds.len().min(RECENT_BUILDS_SHOWN);
            display::render_recent_builds(&r.recent_builds[..shown])
        })?;
        Ok(jobs)
    }

    /// OS name distribution plus the per-version breakdown from the nodes overview.
    async fn os_distribution(&mut self, linux_details: bool) -> io::Result<()> {
        let os = self
            .fetch(OsDetailCollector::new().with_linux_details(linux_details))
            .await;
        self.show(&os, display::render_os_distribution)?;
        let nodes = self.fetch(NodesCollector).await;
        self.show(&nodes, display::render_detailed_os_distribution)
    }

    async fn os_details(&mut self) -> io::Result<()> {
        let opts = self.display;
        let os = self
            .fetch(OsDetailCollector::new().with_linux_details(true))
            .await;
        self.show(&os, display::render_os_distribution)?;
        let nodes = self.fetch(NodesCollector).await;
        self.show(&nodes, display::render_detailed_os_distribution)?;
        self.show(&os, display::render_linux_details)?;
        self.show(&nodes, |r| display::render_os_details(r, &opts))
    }

    async fn labels(&mut self) -> io::Result<()> {
        let opts = self.display;
        let labels = self
            .fetch(LabelsCollector::new().with_job_sample(self.limits.config_sample))
            .await;
        self.show(&labels, |r| display::render_labels(r, &opts))
    }

    /// Fresh collection of every report the alert rules read.
    async fn alerts(&mut self) -> io::Result<()> {
        let disk = self.fetch(DiskCollector).await;
        let nodes = self.fetch(NodesCollector).await;
        let jobs = self.fetch(JobsCollector::new()).await;
        let queue = self
            .fetch(QueueCollector::new().with_item_limit(self.limits.queue_items))
            .await;
        let plugins = self.fetch(PluginsCollector).await;
        let system = self.fetch(SystemCollector).await;

        let inputs = AlertInputs {
            disk: disk.as_ref().ok(),
            nodes: nodes.as_ref().ok().map(NodeMetrics::from),
            jobs: jobs.as_ref().ok().map(JobMetrics::from),
            queue: queue.as_ref().ok(),
            plugins: plugins.as_ref().ok(),
            system: system.as_ref().ok(),
        };
        self.health(&inputs)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_selection_keeps_display_order() {
        let mut selection = Selection::new();
        selection
            .add(Section::Alerts)
            .add(Section::Info)
            .add(Section::Disk);
        let order: Vec<_> = selection.sections().collect();
        assert_eq!(order, vec![Section::Info, Section::Disk, Section::Alerts]);
    }

    #[test]
    fn test_node_tables_accumulate() {
        let mut selection = Selection::new();
        selection
            .add_node_tables(DetailTables {
                os: true,
                hardware: false,
                software: false,
            })
            .add_node_tables(DetailTables {
                os: false,
                hardware: false,
                software: true,
            });
        assert!(selection.contains(Section::NodeDetails));
        assert_eq!(
            selection.node_tables,
            Some(DetailTables {
                os: true,
                hardware: false,
                software: true,
            })
        );

        selection.add(Section::NodeDetails);
        assert_eq!(selection.node_tables, Some(DetailTables::ALL));
    }

    #[test]
    fn test_ldap_only_selects_users_banner() {
        let mut selection = Selection::new();
        selection.add_ldap();
        assert!(selection.contains(Section::Users));
        assert!(selection.ldap);
        assert!(!selection.users);
    }

    #[test]
    fn test_empty_selection_is_overview() {
        assert_eq!(RunMode::from(Selection::new()), RunMode::Overview);
        let mut selection = Selection::new();
        selection.add(Section::Queue);
        assert!(matches!(RunMode::from(selection), RunMode::Selected(_)));
    }

    #[test]
    fn test_titles_are_unique() {
        let titles: BTreeSet<_> = Section::iter().map(Section::title).collect();
        assert_eq!(titles.len(), Section::iter().count());
    }
}
