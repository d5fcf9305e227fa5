//! Jobs overview, job type distribution and recent builds.

use std::collections::BTreeMap;

use crate::api::{Build, Job, JobClass, JobList, simple_class_name};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};

const OVERVIEW_TREE: &str = "jobs[name,url,color,buildable,inQueue,firstBuild[number],\
                             lastBuild[number,timestamp,result,duration]]";

/// Human-readable status for a job `color`.
///
/// An `_anime` suffix marks a running build and appends " (in progress)".
pub fn job_status(color: Option<&str>) -> String {
    let color = color.unwrap_or_default();
    if color.is_empty() {
        return "Not built".to_string();
    }

    let in_progress = color.ends_with("_anime");
    let status = match color.trim_end_matches("_anime") {
        "blue" | "green" => "Success",
        "yellow" => "Unstable",
        "red" => "Failed",
        "aborted" => "Aborted",
        "disabled" => "Disabled",
        "notbuilt" => "Not built",
        _ => "Unknown",
    };

    if in_progress {
        format!("{status} (in progress)")
    } else {
        status.to_string()
    }
}

/// Friendly job type for a `_class` value.
pub fn job_type(class: &str) -> String {
    const TYPES: [(&str, &str); 9] = [
        ("FreeStyleProject", "Freestyle"),
        ("WorkflowMultiBranchProject", "Multi-branch Pipeline"),
        ("WorkflowJob", "Pipeline"),
        ("ExternalJob", "External"),
        ("MatrixProject", "Matrix"),
        ("MavenModuleSet", "Maven"),
        ("IvyModuleSet", "Ivy"),
        ("MultiJobProject", "Multi-job"),
        ("OrganizationFolder", "Organization Folder"),
    ];

    let simple = simple_class_name(class);
    TYPES
        .iter()
        .find(|(key, _)| simple.contains(key))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| simple.to_string())
}

/// Per-status job counts keyed on the first word of [`job_status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub success: usize,
    pub failed: usize,
    pub unstable: usize,
    pub disabled: usize,
    pub not_built: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: &str) {
        match status.split_whitespace().next() {
            Some("Success") => self.success += 1,
            Some("Failed") => self.failed += 1,
            Some("Unstable") => self.unstable += 1,
            Some("Disabled") => self.disabled += 1,
            _ => self.not_built += 1,
        }
    }

    /// Labelled counts in display order.
    pub fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("Success", self.success),
            ("Failed", self.failed),
            ("Unstable", self.unstable),
            ("Disabled", self.disabled),
            ("Not built", self.not_built),
        ]
    }
}

/// Success share among jobs that have been built and are enabled.
pub fn success_rate(success: usize, total: usize, excluded: usize) -> f64 {
    let built = total.saturating_sub(excluded);
    if built == 0 {
        0.0
    } else {
        success as f64 / built as f64 * 100.0
    }
}

/// One job row of the overview.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub name: String,
    pub url: Option<String>,
    pub status: String,
    pub buildable: bool,
    pub in_queue: bool,
    pub first_build: Option<u64>,
    pub last_build: Option<BuildRow>,
}

/// Summary of a single build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRow {
    pub job_name: String,
    pub number: Option<u64>,
    pub timestamp: Option<i64>,
    pub result: Option<String>,
    pub duration_ms: Option<i64>,
}

impl BuildRow {
    fn from_build(job_name: &str, build: &Build) -> Self {
        Self {
            job_name: job_name.to_string(),
            number: build.number,
            timestamp: build.timestamp.filter(|ts| *ts > 0),
            result: build.result.clone(),
            duration_ms: build.duration.filter(|d| *d > 0),
        }
    }
}

/// Jobs overview.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobsReport {
    pub total_jobs: usize,
    pub status_counts: StatusCounts,
    pub success_rate: f64,
    pub jobs: Vec<JobRow>,
    /// Latest build of each job, newest first.
    pub recent_builds: Vec<BuildRow>,
}

impl JobsReport {
    pub fn from_jobs(jobs: &[Job], recent_limit: usize) -> Self {
        let rows: Vec<JobRow> = jobs
            .iter()
            .map(|job| JobRow {
                name: job.name.clone(),
                url: job.url.clone(),
                status: job_status(job.color.as_deref()),
                buildable: job.buildable.unwrap_or(false),
                in_queue: job.in_queue.unwrap_or(false),
                first_build: job.first_build.as_ref().and_then(|b| b.number),
                last_build: job
                    .last_build
                    .as_ref()
                    .map(|b| BuildRow::from_build(&job.name, b)),
            })
            .collect();

        let mut counts = StatusCounts::default();
        for row in &rows {
            counts.record(&row.status);
        }

        let mut recent: Vec<BuildRow> = rows
            .iter()
            .filter_map(|r| r.last_build.clone())
            .filter(|b| b.number.is_some())
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(recent_limit);

        Self {
            total_jobs: rows.len(),
            success_rate: success_rate(
                counts.success,
                rows.len(),
                counts.disabled + counts.not_built,
            ),
            status_counts: counts,
            jobs: rows,
            recent_builds: recent,
        }
    }
}

/// Collects [`JobsReport`].
#[derive(Debug, Clone, Copy)]
pub struct JobsCollector {
    recent_limit: usize,
}

impl JobsCollector {
    pub fn new() -> Self {
        Self { recent_limit: 10 }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}

impl Default for JobsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for JobsCollector {
    type Report = JobsReport;

    fn name(&self) -> &'static str {
        "jobs"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<JobsReport, CollectorError> {
        let list: JobList = client.get_json_tree("api/json", OVERVIEW_TREE).await?;
        Ok(JobsReport::from_jobs(&list.jobs, self.recent_limit))
    }
}

// =============================================================================
// Job types
// =============================================================================

/// Count of one job type.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTypeCount {
    pub job_type: String,
    pub count: usize,
    pub percentage: f64,
}

/// Job type distribution over a sample of jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobTypesReport {
    pub total_analyzed: usize,
    pub types: Vec<JobTypeCount>,
}

impl JobTypesReport {
    /// Tally `_class` values, sorted by count descending then name.
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for class in classes {
            *counts.entry(job_type(class)).or_default() += 1;
        }

        let total: usize = counts.values().sum();
        let mut types: Vec<JobTypeCount> = counts
            .into_iter()
            .map(|(job_type, count)| JobTypeCount {
                job_type,
                count,
                percentage: if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        types.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_analyzed: total,
            types,
        }
    }
}

/// Collects [`JobTypesReport`] by asking each sampled job for its `_class`.
#[derive(Debug, Clone, Copy)]
pub struct JobTypesCollector {
    sample: usize,
}

impl JobTypesCollector {
    pub fn new(sample: usize) -> Self {
        Self { sample }
    }
}

#[async_trait::async_trait]
impl Collector for JobTypesCollector {
    type Report = JobTypesReport;

    fn name(&self) -> &'static str {
        "job_types"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<JobTypesReport, CollectorError> {
        let list: JobList = client.get_json_tree("api/json", "jobs[name,url]").await?;
        if list.jobs.is_empty() {
            return Err(CollectorError::MissingData(
                "No jobs found or unable to retrieve jobs".into(),
            ));
        }

        let mut classes = Vec::new();
        for job in list.jobs.iter().take(self.sample) {
            let Some(url) = job.url.as_deref() else {
                continue;
            };
            match client
                .get_json_tree::<JobClass>(&format!("{url}api/json"), "_class")
                .await
            {
                Ok(JobClass { class: Some(class) }) if !class.is_empty() => classes.push(class),
                Ok(_) => {}
                Err(e) => tracing::debug!(job = %job.name, error = %e, "Skipping job type lookup"),
            }
        }

        Ok(JobTypesReport::from_classes(classes.iter().map(String::as_str)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jobs(value: serde_json::Value) -> Vec<Job> {
        serde_json::from_value(value).unwrap()
    }

    // ==========================================================================
    // Status mapping
    // ==========================================================================

    #[test]
    fn test_job_status_colors() {
        assert_eq!(job_status(Some("blue")), "Success");
        assert_eq!(job_status(Some("green")), "Success");
        assert_eq!(job_status(Some("yellow")), "Unstable");
        assert_eq!(job_status(Some("red")), "Failed");
        assert_eq!(job_status(Some("aborted")), "Aborted");
        assert_eq!(job_status(Some("disabled")), "Disabled");
        assert_eq!(job_status(Some("notbuilt")), "Not built");
        assert_eq!(job_status(Some("")), "Not built");
        assert_eq!(job_status(None), "Not built");
        assert_eq!(job_status(Some("grey")), "Unknown");
    }

    #[test]
    fn test_job_status_in_progress() {
        assert_eq!(job_status(Some("red_anime")), "Failed (in progress)");
        assert_eq!(job_status(Some("blue_anime")), "Success (in progress)");
    }

    #[test]
    fn test_status_counts_first_word() {
        let mut counts = StatusCounts::default();
        for status in ["Success", "Success (in progress)", "Failed", "Aborted", "Unknown"] {
            counts.record(status);
        }
        assert_eq!(counts.success, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.not_built, 2);
    }

    #[test]
    fn test_success_rate_zero_denominator() {
        assert_eq!(success_rate(0, 3, 3), 0.0);
        assert_eq!(success_rate(3, 4, 0), 75.0);
    }

    // ==========================================================================
    // Overview
    // ==========================================================================

    #[test]
    fn test_from_jobs_overview() {
        let jobs = jobs(json!([
            {"name": "api", "color": "blue", "lastBuild": {"number": 7, "timestamp": 2000, "result": "SUCCESS", "duration": 1500}},
            {"name": "web", "color": "red", "lastBuild": {"number": 3, "timestamp": 3000, "result": "FAILURE", "duration": 0}},
            {"name": "old", "color": "disabled"},
            {"name": "new", "color": "notbuilt"}
        ]));
        let report = JobsReport::from_jobs(&jobs, 10);

        assert_eq!(report.total_jobs, 4);
        assert_eq!(report.status_counts.success, 1);
        assert_eq!(report.status_counts.failed, 1);
        assert_eq!(report.status_counts.disabled, 1);
        assert_eq!(report.status_counts.not_built, 1);
        assert!((report.success_rate - 50.0).abs() < 1e-9);

        assert_eq!(report.recent_builds.len(), 2);
        assert_eq!(report.recent_builds[0].job_name, "web");
        assert_eq!(report.recent_builds[0].duration_ms, None);
    }

    #[test]
    fn test_from_jobs_recent_limit() {
        let jobs = jobs(json!([
            {"name": "a", "color": "blue", "lastBuild": {"number": 1, "timestamp": 1}},
            {"name": "b", "color": "blue", "lastBuild": {"number": 1, "timestamp": 3}},
            {"name": "c", "color": "blue", "lastBuild": {"number": 1, "timestamp": 2}}
        ]));
        let report = JobsReport::from_jobs(&jobs, 2);
        let names: Vec<_> = report.recent_builds.iter().map(|b| b.job_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    // ==========================================================================
    // Job types
    // ==========================================================================

    #[test]
    fn test_job_type_mapping() {
        assert_eq!(job_type("hudson.model.FreeStyleProject"), "Freestyle");
        assert_eq!(
            job_type("org.jenkinsci.plugins.workflow.job.WorkflowJob"),
            "Pipeline"
        );
        assert_eq!(
            job_type("org.jenkinsci.plugins.workflow.multibranch.WorkflowMultiBranchProject"),
            "Multi-branch Pipeline"
        );
        assert_eq!(job_type("com.cloudbees.hudson.plugins.folder.Folder"), "Folder");
    }

    #[test]
    fn test_job_types_from_classes() {
        let report = JobTypesReport::from_classes([
            "hudson.model.FreeStyleProject",
            "org.jenkinsci.plugins.workflow.job.WorkflowJob",
            "org.jenkinsci.plugins.workflow.job.WorkflowJob",
            "org.jenkinsci.plugins.workflow.job.WorkflowJob",
        ]);
        assert_eq!(report.total_analyzed, 4);
        assert_eq!(report.types[0].job_type, "Pipeline");
        assert_eq!(report.types[0].count, 3);
        assert!((report.types[0].percentage - 75.0).abs() < 1e-9);
    }
}
