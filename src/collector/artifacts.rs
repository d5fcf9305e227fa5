//! Artifacts archived by each job's last build.

use crate::api::{Artifact, Build, JobList};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};

/// One archived artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRow {
    pub job_name: String,
    pub artifact_name: String,
    pub size: u64,
    pub build_number: Option<u64>,
    pub timestamp: Option<i64>,
    /// Jenkins does not track downloads; always zero.
    pub downloads: u64,
}

/// Artifact size, falling back to a `Size: N` suffix in the display path.
pub fn artifact_size(artifact: &Artifact) -> u64 {
    if let Some(size) = artifact.size.filter(|s| *s > 0) {
        return size;
    }
    artifact
        .display_path
        .as_deref()
        .and_then(|p| p.split_once("Size:"))
        .and_then(|(_, rest)| rest.trim().parse().ok())
        .unwrap_or(0)
}

/// Largest artifacts first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactsReport {
    pub artifacts: Vec<ArtifactRow>,
}

impl ArtifactsReport {
    pub fn push_build(&mut self, job_name: &str, build: &Build) {
        for artifact in &build.artifacts {
            self.artifacts.push(ArtifactRow {
                job_name: job_name.to_string(),
                artifact_name: artifact
                    .file_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                size: artifact_size(artifact),
                build_number: build.number,
                timestamp: build.timestamp,
                downloads: 0,
            });
        }
    }

    pub fn finish(&mut self, limit: usize) {
        self.artifacts.sort_by(|a, b| b.size.cmp(&a.size));
        self.artifacts.truncate(limit);
    }
}

/// Collects [`ArtifactsReport`].
#[derive(Debug, Clone, Copy)]
pub struct ArtifactsCollector {
    limit: usize,
}

impl ArtifactsCollector {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

#[async_trait::async_trait]
impl Collector for ArtifactsCollector {
    type Report = ArtifactsReport;

    fn name(&self) -> &'static str {
        "artifacts"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<ArtifactsReport, CollectorError> {
        let list: JobList = client
            .get_json_tree("api/json", "jobs[name,url,lastBuild[number]]")
            .await?;

        let mut report = ArtifactsReport::default();
        for job in list.jobs.iter().filter(|j| j.last_build.is_some()) {
            let Some(url) = job.url.as_deref() else {
                continue;
            };
            match client
                .get_json_tree::<Build>(
                    &format!("{url}lastBuild/api/json"),
                    "number,artifacts[*],timestamp",
                )
                .await
            {
                Ok(build) => report.push_build(&job.name, &build),
                Err(e) => tracing::debug!(job = %job.name, error = %e, "Skipping artifacts"),
            }
        }

        report.finish(self.limit);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_size_fallback() {
        let artifact: Artifact = serde_json::from_value(json!({
            "fileName": "app.jar",
            "displayPath": "app.jar Size: 2048"
        }))
        .unwrap();
        assert_eq!(artifact_size(&artifact), 2048);

        let unknown: Artifact = serde_json::from_value(json!({"fileName": "x"})).unwrap();
        assert_eq!(artifact_size(&unknown), 0);
    }

    #[test]
    fn test_report_sorted_and_limited() {
        let build: Build = serde_json::from_value(json!({
            "number": 12,
            "timestamp": 1000,
            "artifacts": [
                {"fileName": "small.txt", "size": 10},
                {"fileName": "big.tar", "size": 5000},
                {"fileName": "mid.zip", "size": 700}
            ]
        }))
        .unwrap();

        let mut report = ArtifactsReport::default();
        report.push_build("release", &build);
        report.finish(2);

        let names: Vec<_> = report.artifacts.iter().map(|a| a.artifact_name.as_str()).collect();
        assert_eq!(names, vec!["big.tar", "mid.zip"]);
        assert_eq!(report.artifacts[0].build_number, Some(12));
    }
}
