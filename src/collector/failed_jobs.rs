//! Failing and unstable jobs with their recent history and a guess at the
//! failure cause from the console log.

use serde::Deserialize;

use crate::api::{Build, JobList};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};

const FAILING_COLORS: [&str; 4] = ["red", "red_anime", "yellow", "yellow_anime"];

/// Console log markers, checked in order.
const ERROR_PATTERNS: [&str; 10] = [
    "BUILD FAILURE",
    "Compilation failure",
    "Test failures",
    "Error:",
    "Exception:",
    "NullPointerException",
    "OutOfMemoryError",
    "Connection refused",
    "java.io.IOException",
    "Timeout",
];

const MAX_REASON_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildList {
    builds: Vec<Build>,
}

fn is_failure(build: &Build) -> bool {
    matches!(build.result.as_deref(), Some("FAILURE" | "UNSTABLE"))
}

fn is_success(build: &Build) -> bool {
    build.result.as_deref() == Some("SUCCESS")
}

/// One failing job.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedJob {
    pub job_name: String,
    pub last_failed: Option<i64>,
    pub fail_count: usize,
    pub success_rate: f64,
    pub last_success: Option<i64>,
    pub failure_reason: String,
}

impl FailedJob {
    /// Summarise recent builds (newest first) of one job.
    pub fn from_builds(job_name: &str, builds: &[Build]) -> Self {
        let total = builds.len();
        let successes = builds.iter().filter(|b| is_success(b)).count();

        Self {
            job_name: job_name.to_string(),
            last_failed: builds.iter().find(|b| is_failure(b)).and_then(|b| b.timestamp),
            fail_count: builds.iter().filter(|b| is_failure(b)).count(),
            success_rate: if total > 0 {
                successes as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            last_success: builds.iter().find(|b| is_success(b)).and_then(|b| b.timestamp),
            failure_reason: "Unknown".to_string(),
        }
    }
}

/// First log line containing a known error marker, capped at 100 chars.
pub fn failure_reason(log: &str) -> Option<String> {
    let pattern = ERROR_PATTERNS.iter().find(|p| log.contains(*p))?;
    let line = log.lines().find(|line| line.contains(pattern))?;

    if line.chars().count() > MAX_REASON_CHARS {
        let head: String = line.chars().take(MAX_REASON_CHARS - 3).collect();
        Some(format!("{head}..."))
    } else {
        Some(line.to_string())
    }
}

/// Failing jobs, most recently failed first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailedJobsReport {
    pub jobs: Vec<FailedJob>,
}

/// Collects [`FailedJobsReport`].
#[derive(Debug, Clone, Copy)]
pub struct FailedJobsCollector {
    limit: usize,
}

impl FailedJobsCollector {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    async fn reason(&self, client: &JenkinsClient, job_url: &str, builds: &[Build]) -> String {
        let Some(number) = builds.iter().find(|b| is_failure(b)).and_then(|b| b.number) else {
            return "Unknown".to_string();
        };

        match client.get_text(&format!("{job_url}{number}/consoleText")).await {
            Ok(log) => failure_reason(&log).unwrap_or_else(|| "Unknown".to_string()),
            Err(e) => {
                tracing::debug!(url = %job_url, build = number, error = %e, "Console log unavailable");
                "Unknown".to_string()
            }
        }
    }
}

#[async_trait::async_trait]
impl Collector for FailedJobsCollector {
    type Report = FailedJobsReport;

    fn name(&self) -> &'static str {
        "failed_jobs"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<FailedJobsReport, CollectorError> {
        let list: JobList = client
            .get_json_tree("api/json", "jobs[name,url,color,lastBuild[number,timestamp,result]]")
            .await?;

        let mut failed = Vec::new();
        for job in &list.jobs {
            let failing = job
                .color
                .as_deref()
                .is_some_and(|c| FAILING_COLORS.contains(&c));
            if !failing || job.last_build.is_none() {
                continue;
            }
            let Some(url) = job.url.as_deref() else {
                continue;
            };

            let builds = match client
                .get_json_tree::<BuildList>(
                    &format!("{url}api/json"),
                    "builds[number,result,timestamp,duration]{0,10}",
                )
                .await
            {
                Ok(list) if !list.builds.is_empty() => list.builds,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(job = %job.name, error = %e, "Skipping job history");
                    continue;
                }
            };

            let mut entry = FailedJob::from_builds(&job.name, &builds);
            entry.failure_reason = self.reason(client, url, &builds).await;
            failed.push(entry);
        }

        failed.sort_by(|a, b| b.last_failed.cmp(&a.last_failed));
        failed.truncate(self.limit);

        Ok(FailedJobsReport { jobs: failed })
    }
}
