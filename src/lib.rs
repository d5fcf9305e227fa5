//! Jenkins Dashboard - Read-only Jenkins Monitoring Library
//!
//! This crate provides the core functionality of the `jenkins-dashboard`
//! console tool. It can be used as a library by other Rust projects, or run as
//! a standalone binary.
//!
//! # Architecture
//!
//! - **Client**: authenticated, GET-only session against the REST/JSON and HTML endpoints
//! - **Collectors**: one per area (jobs, nodes, plugins, queue, ...), each producing a typed report
//! - **Display**: grid tables rendered from the reports
//! - **Alerts**: threshold classification of collected reports into severity-tagged findings
//! - **Dashboard**: overview, comprehensive and per-section runs
//!
//! # Example
//!
//! ```rust,ignore
//! use jenkins_dashboard::client::{ClientConfig, JenkinsClient};
//! use jenkins_dashboard::dashboard::{Dashboard, RunMode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = JenkinsClient::new(ClientConfig::new("ci.example.com", "admin", "token"))?;
//!     client.login().await?;
//!
//!     let mut dashboard = Dashboard::new(&client, std::io::stdout());
//!     dashboard.run(&RunMode::Overview).await?;
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod api;
pub mod client;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod format;

pub use alerts::{AlertSummary, AlertThresholds};
pub use client::{ClientConfig, ClientError, JenkinsClient};
pub use collector::{Collector, CollectorError};
pub use config::AppConfig;
pub use dashboard::{Dashboard, RunMode, Section, Selection};
