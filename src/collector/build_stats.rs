//! Build duration and build frequency statistics.

use chrono::Utc;
use serde::Deserialize;

use crate::api::{Build, JobList};
use crate::client::JenkinsClient;
use crate::collector::{Collector, CollectorError};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Trend swing (percent) below which a job counts as stable.
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildList {
    builds: Vec<Build>,
}

/// Direction of the duration trend between older and newer builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn from_percent(percent: f64) -> Self {
        if percent > TREND_THRESHOLD {
            Self::Up
        } else if percent < -TREND_THRESHOLD {
            Self::Down
        } else {
            Self::Stable
        }
    }
}

/// Duration statistics of one job, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDuration {
    pub job_name: String,
    pub avg_ms: f64,
    pub min_ms: i64,
    pub max_ms: i64,
    pub last_ms: i64,
    /// Percentage change of the second half of the sample over the first.
    pub trend_percent: f64,
    pub trend: Trend,
}

impl JobDuration {
    /// Statistics over builds listed newest first. `None` when no build has a
    /// positive duration.
    pub fn from_builds(job_name: &str, builds: &[Build]) -> Option<Self> {
        let durations: Vec<i64> = builds
            .iter()
            .filter_map(|b| b.duration)
            .filter(|d| *d > 0)
            .collect();
        if durations.is_empty() {
            return None;
        }

        let mean = |values: &[i64]| values.iter().sum::<i64>() as f64 / values.len() as f64;

        let mut trend_percent = 0.0;
        if durations.len() > 1 {
            let (first, second) = durations.split_at(durations.len() / 2);
            let first_avg = mean(first);
            if first_avg > 0.0 {
                trend_percent = (mean(second) - first_avg) / first_avg * 100.0;
            }
        }

        Some(Self {
            job_name: job_name.to_string(),
            avg_ms: mean(&durations),
            min_ms: durations.iter().copied().min().unwrap_or_default(),
            max_ms: durations.iter().copied().max().unwrap_or_default(),
            last_ms: builds.first().and_then(|b| b.duration).unwrap_or(0),
            trend_percent,
            trend: Trend::from_percent(trend_percent),
        })
    }
}

/// Build counts of one job over rolling windows.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFrequency {
    pub job_name: String,
    pub total_builds: usize,
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub avg_per_day: f64,
}

impl JobFrequency {
    /// Counts over builds listed newest first, relative to `now_ms`.
    pub fn from_builds(job_name: &str, builds: &[Build], now_ms: i64) -> Option<Self> {
        if builds.is_empty() {
            return None;
        }

        let since = |window_ms: i64| {
            builds
                .iter()
                .filter(|b| b.timestamp.unwrap_or(0) >= now_ms - window_ms)
                .count()
        };

        let this_month = since(30 * DAY_MS);
        let avg_per_day = if this_month > 0 {
            this_month as f64 / 30.0
        } else {
            let oldest = builds.last().and_then(|b| b.timestamp).unwrap_or(now_ms);
            let days = (now_ms - oldest) as f64 / DAY_MS as f64;
            if days > 0.0 {
                builds.len() as f64 / days
            } else {
                0.0
            }
        };

        Some(Self {
            job_name: job_name.to_string(),
            total_builds: builds.len(),
            today: since(DAY_MS),
            this_week: since(7 * DAY_MS),
            this_month,
            avg_per_day,
        })
    }
}

/// Longest-running and most frequently built jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStatsReport {
    /// Sorted by average duration, longest first.
    pub durations: Vec<JobDuration>,
    /// Sorted by builds in the last 24 hours, most first.
    pub frequencies: Vec<JobFrequency>,
}

/// Collects [`BuildStatsReport`].
#[derive(Debug, Clone, Copy)]
pub struct BuildStatsCollector {
    limit: usize,
}

impl BuildStatsCollector {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

#[async_trait::async_trait]
impl Collector for BuildStatsCollector {
    type Report = BuildStatsReport;

    fn name(&self) -> &'static str {
        "build_stats"
    }

    async fn collect(&self, client: &JenkinsClient) -> Result<BuildStatsReport, CollectorError> {
        let list: JobList = client
            .get_json_tree("api/json", "jobs[name,url,lastBuild[number]]")
            .await?;
        let now = Utc::now().timestamp_millis();

        let mut report = BuildStatsReport::default();
        for job in list.jobs.iter().filter(|j| j.last_build.is_some()) {
            let Some(url) = job.url.as_deref() else {
                continue;
            };
            let endpoint = format!("{url}api/json");

            match client
                .get_json_tree::<BuildList>(&endpoint, "builds[number,duration,result,timestamp]{0,10}")
                .await
            {
                Ok(list) => report
                    .durations
                    .extend(JobDuration::from_builds(&job.name, &list.builds)),
                Err(e) => tracing::debug!(job = %job.name, error = %e, "Skipping build durations"),
            }

            match client
                .get_json_tree::<BuildList>(&endpoint, "builds[number,timestamp]{0,100}")
                .await
            {
                Ok(list) => report
                    .frequencies
                    .extend(JobFrequency::from_builds(&job.name, &list.builds, now)),
                Err(e) => tracing::debug!(job = %job.name, error = %e, "Skipping build frequency"),
            }
        }

        report
            .durations
            .sort_by(|a, b| b.avg_ms.total_cmp(&a.avg_ms));
        report.durations.truncate(self.limit);
        report.frequencies.sort_by(|a, b| b.today.cmp(&a.today));
        report.frequencies.truncate(self.limit);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builds(value: serde_json::Value) -> Vec<Build> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_trend_threshold() {
        assert_eq!(Trend::from_percent(5.1), Trend::Up);
        assert_eq!(Trend::from_percent(5.0), Trend::Stable);
        assert_eq!(Trend::from_percent(-5.0), Trend::Stable);
        assert_eq!(Trend::from_percent(-7.5), Trend::Down);
        assert_eq!(Trend::Up.to_string(), "up");
    }

    #[test]
    fn test_job_duration_stats() {
        let builds = builds(json!([
            {"duration": 4000},
            {"duration": 2000},
            {"duration": 0},
            {"duration": 3000},
            {"duration": 1000}
        ]));
        let stats = JobDuration::from_builds("api", &builds).unwrap();
        assert_eq!(stats.min_ms, 1000);
        assert_eq!(stats.max_ms, 4000);
        assert_eq!(stats.last_ms, 4000);
        assert!((stats.avg_ms - 2500.0).abs() < 1e-9);
        // first half [4000, 2000] avg 3000, second half [3000, 1000] avg 2000
        assert!((stats.trend_percent + 33.333).abs() < 0.01);
        assert_eq!(stats.trend, Trend::Down);
    }

    #[test]
    fn test_job_duration_no_positive_durations() {
        assert!(JobDuration::from_builds("x", &builds(json!([{"duration": 0}]))).is_none());
    }

    #[test]
    fn test_job_frequency_windows() {
        let now = 100 * DAY_MS;
        let builds = builds(json!([
            {"timestamp": now - 1000},
            {"timestamp": now - 3 * DAY_MS},
            {"timestamp": now - 20 * DAY_MS},
            {"timestamp": now - 60 * DAY_MS}
        ]));
        let freq = JobFrequency::from_builds("api", &builds, now).unwrap();
        assert_eq!(freq.total_builds, 4);
        assert_eq!(freq.today, 1);
        assert_eq!(freq.this_week, 2);
        assert_eq!(freq.this_month, 3);
        assert!((freq.avg_per_day - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_job_frequency_all_time_average() {
        let now = 100 * DAY_MS;
        let builds = builds(json!([
            {"timestamp": now - 40 * DAY_MS},
            {"timestamp": now - 50 * DAY_MS}
        ]));
        let freq = JobFrequency::from_builds("old", &builds, now).unwrap();
        assert_eq!(freq.this_month, 0);
        assert!((freq.avg_per_day - 2.0 / 50.0).abs() < 1e-9);
    }
}
