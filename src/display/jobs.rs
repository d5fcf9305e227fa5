//! Job renderers: summary, overview, types, recent builds, failures,
//! build statistics and artifacts.

use crate::collector::build_stats::Trend;
use crate::collector::jobs::BuildRow;
use crate::collector::{
    ArtifactsReport, BuildStatsReport, FailedJobsReport, JobTypesReport, JobsReport,
    JobsSummaryReport,
};
use crate::display::{DisplayOptions, Page, grid, or_unknown, property_table, row};
use crate::format::{
    Polarity, Tone, format_duration, format_percentage, format_size, format_status,
    format_timestamp, paint,
};

const STATUS_BAR_LENGTH: usize = 50;

/// Longest failure reason shown before eliding.
const REASON_WIDTH: usize = 60;

/// Stacked bar of success/failed/unstable/other job counts.
fn status_bar(total: usize, success: usize, failed: usize, unstable: usize) -> [String; 2] {
    let share = |n: usize| STATUS_BAR_LENGTH * n / total;
    let (s, f, u) = (share(success), share(failed), share(unstable));
    let other = total.saturating_sub(success + failed + unstable);
    let bar = format!(
        "{}{}{}{}",
        paint("█".repeat(s), Tone::Success),
        paint("█".repeat(f), Tone::Error),
        paint("█".repeat(u), Tone::Warning),
        "█".repeat(STATUS_BAR_LENGTH.saturating_sub(s + f + u)),
    );
    let legend = format!(
        "{} {} {} ■ Other ({other})",
        paint(format!("■ Success ({success})"), Tone::Success),
        paint(format!("■ Failed ({failed})"), Tone::Error),
        paint(format!("■ Unstable ({unstable})"), Tone::Warning),
    );
    [bar, legend]
}

pub fn render_jobs_summary(report: &JobsSummaryReport) -> String {
    let status = &report.status;
    let rows = vec![
        ("Total Jobs", report.total.to_string()),
        ("Successful", paint(status.successful, Tone::Success)),
        ("Failed", paint(status.failed, Tone::Error)),
        ("Unstable", paint(status.unstable, Tone::Warning)),
        ("Disabled", paint(status.disabled, Tone::Disabled)),
        ("Building", paint(status.building, Tone::Building)),
        ("Not Built", status.not_built.to_string()),
        (
            "Success Rate",
            format_percentage(report.success_rate, Polarity::HigherIsBetter),
        ),
        ("Builds in Last 24h", report.builds_last_24h.to_string()),
    ];

    let mut page = Page::new();
    page.table("Jenkins Jobs Summary", &property_table(["Metric", "Value"], rows));

    let results = &report.recent_results;
    if results.success + results.failure + results.unstable + results.aborted > 0 {
        let rows = vec![
            ("Successful", paint(results.success, Tone::Success)),
            ("Failed", paint(results.failure, Tone::Error)),
            ("Unstable", paint(results.unstable, Tone::Warning)),
            ("Aborted", paint(results.aborted, Tone::Disabled)),
        ];
        page.table("Recent Build Results", &property_table(["Result", "Count"], rows));
    }

    if !report.job_types.is_empty() {
        let mut types: Vec<(&String, &usize)> = report.job_types.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let mut table = grid(&["Job Type", "Count"]);
        for (job_type, count) in types {
            table.add_row(row([job_type.clone(), count.to_string()]));
        }
        page.table("Job Types Distribution", &table);
    }

    if report.total > 0 {
        let [bar, legend] = status_bar(
            report.total,
            status.successful,
            status.failed,
            status.unstable,
        );
        page.line("\nJob Status Distribution:").line(bar).line(legend);
    }

    page.finish()
}

pub fn render_jobs_overview(report: &JobsReport, opts: &DisplayOptions) -> String {
    let mut rows = vec![
        ("Total Jobs", report.total_jobs.to_string()),
        (
            "Success Rate",
            format_percentage(report.success_rate, Polarity::HigherIsBetter),
        ),
    ];
    rows.extend(
        report
            .status_counts
            .entries()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(label, count)| (label, count.to_string())),
    );

    let mut page = Page::new();
    page.table("Jenkins Jobs Overview", &property_table(["Metric", "Value"], rows));

    if report.jobs.is_empty() {
        page.line("No jobs found");
        return page.finish();
    }

    let mut jobs: Vec<_> = report.jobs.iter().collect();
    jobs.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.name.cmp(&b.name)));
    let (shown, note) = opts.limit(&jobs, "jobs");

    let mut table = grid(&[
        "Job Name",
        "Status",
        "Last Build",
        "Build Time",
        "Result",
        "Duration",
    ]);
    for job in shown {
        let last = job.last_build.as_ref();
        table.add_row(row([
            job.name.clone(),
            format_status(&job.status),
            last.and_then(|b| b.number)
                .map_or_else(|| "N/A".to_string(), |n| n.to_string()),
            last.and_then(|b| b.timestamp)
                .map_or_else(|| "N/A".to_string(), format_timestamp),
            last.and_then(|b| b.result.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            last.and_then(|b| b.duration_ms)
                .map_or_else(|| "N/A".to_string(), |d| format_duration(d as f64)),
        ]));
    }
    page.table("Jenkins Jobs", &table).note(note);
    page.finish()
}

pub fn render_job_types(report: &JobTypesReport) -> String {
    let mut page = Page::new();
    if report.types.is_empty() {
        page.message("No job type information available", Tone::Warning);
        return page.finish();
    }

    let mut table = grid(&["Job Type", "Count", "Percentage"]);
    for t in &report.types {
        table.add_row(row([
            t.job_type.clone(),
            t.count.to_string(),
            format!("{:.1}%", t.percentage),
        ]));
    }
    page.table("Jenkins Job Types Distribution", &table);
    page.finish()
}

fn build_result(result: Option<&str>) -> String {
    match result {
        Some("SUCCESS") => paint("Success", Tone::Success),
        Some("FAILURE") => paint("Failure", Tone::Error),
        Some("UNSTABLE") => paint("Unstable", Tone::Warning),
        Some("ABORTED") => paint("Aborted", Tone::Warning),
        Some(other) => other.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn render_recent_builds(builds: &[BuildRow]) -> String {
    let mut page = Page::new();
    if builds.is_empty() {
        page.message("No recent builds found", Tone::Warning);
        return page.finish();
    }

    let mut table = grid(&["Job Name", "Build #", "Result", "When", "Duration"]);
    for build in builds {
        table.add_row(row([
            build.job_name.clone(),
            build.number.map_or_else(|| "N/A".to_string(), |n| n.to_string()),
            build_result(build.result.as_deref()),
            build.timestamp.map_or_else(|| "N/A".to_string(), format_timestamp),
            build.duration_ms
                .map_or_else(|| "N/A".to_string(), |d| format_duration(d as f64)),
        ]));
    }
    page.table("Recent Builds", &table);
    page.finish()
}

fn elide(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width).collect::<String>())
    } else {
        text.to_string()
    }
}

pub fn render_failed_jobs(report: &FailedJobsReport) -> String {
    let mut page = Page::new();
    if report.jobs.is_empty() {
        page.message("No failing jobs found! 🎉", Tone::Success);
        return page.finish();
    }

    let mut table = grid(&[
        "Job Name",
        "Last Failed",
        "Fail Count",
        "Success Rate",
        "Last Success",
        "Common Failure Reason",
    ]);
    for job in &report.jobs {
        table.add_row(row([
            job.job_name.clone(),
            job.last_failed.map_or_else(|| "Never".to_string(), format_timestamp),
            job.fail_count.to_string(),
            format_percentage(job.success_rate, Polarity::HigherIsBetter),
            job.last_success.map_or_else(|| "Never".to_string(), format_timestamp),
            elide(&job.failure_reason, REASON_WIDTH),
        ]));
    }
    page.table(&format!("Failed Jobs ({} jobs)", report.jobs.len()), &table);
    page.finish()
}

fn trend_cell(trend: Trend, percent: f64) -> String {
    match trend {
        Trend::Up => paint(format!("↑ {percent:.1}%"), Tone::Error),
        Trend::Down => paint(format!("↓ {percent:.1}%"), Tone::Success),
        Trend::Stable => format!("→ {percent:.1}%"),
    }
}

pub fn render_build_stats(report: &BuildStatsReport) -> String {
    let mut page = Page::new();

    if report.durations.is_empty() {
        page.message("No build duration information available", Tone::Warning);
    } else {
        let mut table = grid(&[
            "Job Name",
            "Average",
            "Shortest",
            "Longest",
            "Last Build",
            "Trend",
        ]);
        for job in &report.durations {
            table.add_row(row([
                job.job_name.clone(),
                format_duration(job.avg_ms),
                format_duration(job.min_ms as f64),
                format_duration(job.max_ms as f64),
                format_duration(job.last_ms as f64),
                trend_cell(job.trend, job.trend_percent),
            ]));
        }
        page.table("Build Duration Table (Jobs with Longest Builds)", &table);
    }

    if report.frequencies.is_empty() {
        page.message("No build frequency information available", Tone::Warning);
    } else {
        let mut table = grid(&[
            "Job Name",
            "Total Builds",
            "Today",
            "This Week",
            "This Month",
            "Avg Per Day",
        ]);
        for job in &report.frequencies {
            let avg = format!("{:.1}", job.avg_per_day);
            let avg = if job.avg_per_day >= 10.0 {
                paint(avg, Tone::Error)
            } else if job.avg_per_day >= 5.0 {
                paint(avg, Tone::Warning)
            } else {
                avg
            };
            table.add_row(row([
                job.job_name.clone(),
                job.total_builds.to_string(),
                job.today.to_string(),
                job.this_week.to_string(),
                job.this_month.to_string(),
                avg,
            ]));
        }
        page.table("Build Frequency Table (Most Frequently Built Jobs)", &table);
    }

    page.finish()
}

pub fn render_artifacts(report: &ArtifactsReport) -> String {
    let mut page = Page::new();
    if report.artifacts.is_empty() {
        page.message("No build artifacts information available", Tone::Warning);
        return page.finish();
    }

    let mut table = grid(&[
        "Job Name",
        "Artifact Name",
        "Size",
        "Build #",
        "Age",
        "Downloads",
    ]);
    for artifact in &report.artifacts {
        table.add_row(row([
            artifact.job_name.clone(),
            artifact.artifact_name.clone(),
            format_size(artifact.size),
            or_unknown(artifact.build_number),
            or_unknown(artifact.timestamp.map(format_timestamp)),
            artifact.downloads.to_string(),
        ]));
    }
    page.table("Build Artifacts Table", &table);
    page.finish()
}
