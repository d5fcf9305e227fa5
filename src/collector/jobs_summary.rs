//! Lightweight jobs summary used by the overview.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;

use crate::api::{Build, Job, JobClass, JobList};
use crate::client::JenkinsClient;
use crate::collector::jobs::{job_type, success_rate};
use crate::collector::{Collector, CollectorError};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Jobs sampled for the type distribution.
const DEFAULT_TYPE_SAMPLE: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildList {
    builds: Vec<Build>,
}

/// Job counts by color bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStatusTally {
    pub successful: usize,
    pub failed: usize,
    pub unstable: usize,
    pub disabled: usize,
    pub building: usize,
    pub not_built: usize,
}

impl JobStatusTally {
    /// Bucket by raw color. Running builds of a known color count towards
    /// that color; other `_anime` colors count as building.
    pub fn record(&mut self, color: Option<&str>) {
        match color.unwrap_or_default() {
            "" => self.not_built += 1,
            "disabled" => self.disabled += 1,
            "red" | "red_anime" => self.failed += 1,
            "yellow" | "yellow_anime" => self.unstable += 1,
            "blue" | "blue_anime" | "green" | "green_anime" => self.successful += 1,
            other if other.contains("_anime") => self.building += 1,
            _ => self.not_built += 1,
        }
    }
}

/// Result counts of recent builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildResultCounts {
    pub success: usize,
    pub failure: usize,
    pub unstable: usize,
    pub aborted: usize,
}

/// Jobs summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobsSummaryReport {
    pub total: usize,
    pub status: JobStatusTally,
    pub success_rate: f64,
    pub builds_last_24h: usize,
    pub recent_results: BuildResultCounts,
    pub job_types: BTreeMap<String, usize>,
}

impl JobsSummaryReport {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let mut status = JobStatusTally::default();
        for job in jobs {
            status.record(job.color.as_deref());
        }

        Self {
            total: jobs.len(),
            success_rate: success_rate(
                status.successful,
                jobs.len(),
                status.disabled + status.not_built,
            ),
            status,
            ..Self::default()
        }
    }

    /// Count results and builds newer than 24 hours before `now_ms`.
    pub fn apply_builds(&mut self, builds: &[Build], now_ms: i64) {
        let day_ago = now_ms - DAY_MS;
        for build in builds {
            match build.result.as_deref() {
                Some("SUCCESS") => self.recent_results.success += 1,
                Some("FAILURE") => self.recent_results.failure += 1,
                Some("UNSTABLE") => self.recent_results.unstable += 1,
                Some("ABORTED") => self.recent_results.aborted += 1,
                _ => {}
            }
            if build.timestamp.unwrap_or(0) > day_ago {
                self.builds_last_24h += 1;
            }
        }
    }
}

/// Collects [`JobsSummaryReport`].
#[derive(Debug, Clone, Copy)]
pub struct JobsSummaryCollector {
    type_sample: usize,
}

impl JobsSummaryCollector {
    pub fn new() -> Self {
        Self {
            type_sample: DEFAULT_TYPE_SAMPLE,
        }
    }

    pub fn with_type_sample(mut self, sample: usize) -> Self {
        self.type_sample = sample;
        self
    }
}

impl Default for JobsSummaryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for JobsSummaryCollector {
    type Report = JobsSummaryReport;

    fn name(&self) -> &'static str {
        "jobs_summary"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<JobsSummaryReport, CollectorError> {
        let list: JobList = client
            .get_json_tree("api/json", "jobs[name,url,color,buildable,inQueue]")
            .await?;
        let mut report = JobsSummaryReport::from_jobs(&list.jobs);

        if let Ok(builds) = client
            .get_json_tree::<BuildList>("api/json", "builds[timestamp,result]{0,50}")
            .await
        {
            report.apply_builds(&builds.builds, Utc::now().timestamp_millis());
        }

        for job in list.jobs.iter().take(self.type_sample) {
            let Some(url) = job.url.as_deref() else {
                continue;
            };
            if let Ok(JobClass { class: Some(class) }) = client
                .get_json_tree::<JobClass>(&format!("{url}api/json"), "_class")
                .await
            {
                *report.job_types.entry(job_type(&class)).or_default() += 1;
            }
        }

        Ok(report)
    }
}
