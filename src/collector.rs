//! Collector Layer
//!
//! One collector per monitored facet of a Jenkins server. Each issues a few
//! sequential GETs through a shared [`JenkinsClient`](crate::client::JenkinsClient)
//! and reshapes the answers into a typed report.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait, `collect()` returns a report or a [`CollectorError`]
//! - Reshaping lives in pure `from_*` constructors on each report so it can be
//!   tested without a server
//! - [`job_config`]: shared sampling of job `config.xml` documents
//!
//! # Example
//!
//! ```rust,no_run
//! use jenkins_dashboard::client::{ClientConfig, JenkinsClient};
//! use jenkins_dashboard::collector::{Collector, DiskCollector};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = JenkinsClient::new(ClientConfig::new("ci.example.com", "admin", "token"))?;
//! client.login().await?;
//! let disk = DiskCollector.collect(&client).await?;
//! println!("disk usage: {:.1}%", disk.usage_percent);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod build_stats;
pub mod disk;
pub mod email;
pub mod executors;
pub mod failed_jobs;
pub mod hardware;
pub mod info;
pub mod job_config;
pub mod jobs;
pub mod jobs_summary;
pub mod labels;
pub mod node_details;
pub mod nodes;
pub mod nodes_summary;
pub mod notifications;
pub mod os_detail;
pub mod plugins;
pub mod queue;
pub mod security;
pub mod system;
pub mod tools;
mod traits;
pub mod users;

pub use artifacts::{ArtifactsCollector, ArtifactsReport};
pub use build_stats::{BuildStatsCollector, BuildStatsReport};
pub use disk::{DiskCollector, DiskReport};
pub use email::{EmailCollector, EmailReport};
pub use executors::{ExecutorsCollector, ExecutorsReport};
pub use failed_jobs::{FailedJobsCollector, FailedJobsReport};
pub use hardware::{HardwareCollector, HardwareReport};
pub use info::{InfoCollector, InfoReport};
pub use jobs::{JobTypesCollector, JobTypesReport, JobsCollector, JobsReport};
pub use jobs_summary::{JobsSummaryCollector, JobsSummaryReport};
pub use labels::{LabelsCollector, LabelsReport};
pub use node_details::{DetailTables, NodeDetailsCollector, NodeDetailsReport};
pub use nodes::{NodesCollector, NodesReport};
pub use nodes_summary::{NodesSummaryCollector, NodesSummaryReport};
pub use notifications::{NotificationsCollector, NotificationsReport};
pub use os_detail::{OsDetailCollector, OsDetailReport};
pub use plugins::{PluginsCollector, PluginsReport};
pub use queue::{QueueCollector, QueueReport};
pub use security::{SecurityCollector, SecurityReport};
pub use system::{SystemCollector, SystemReport};
pub use tools::{ToolsCollector, ToolsReport};
pub use traits::{Collector, CollectorError};
pub use users::{UsersCollector, UsersReport};
