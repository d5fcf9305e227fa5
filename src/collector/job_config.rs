//! Sampling of job `config.xml` documents, shared by the collectors that
//! look for settings inside job definitions.

use crate::api::JobList;
use crate::client::{ClientError, JenkinsClient};

/// A job's name and raw `config.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub name: String,
    pub xml: String,
}

/// Fetch the configuration of the first `sample` top-level jobs.
///
/// # Errors
/// Fails only when the job list itself cannot be read. Individual configs
/// that cannot be fetched are skipped.
pub async fn sample_job_configs(
    client: &JenkinsClient,
    sample: usize,
) -> Result<Vec<JobConfig>, ClientError> {
    let list: JobList = client.get_json_tree("api/json", "jobs[name,url]").await?;

    let mut configs = Vec::new();
    for job in list.jobs.iter().take(sample) {
        let Some(url) = job.url.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        match client.get_text(&format!("{url}config.xml")).await {
            Ok(xml) => configs.push(JobConfig {
                name: job.name.clone(),
                xml,
            }),
            Err(e) => tracing::debug!(job = %job.name, error = %e, "Skipping job config"),
        }
    }
    Ok(configs)
}
