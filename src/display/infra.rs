//! Plugin, build queue and tool installation renderers.

use strum::IntoEnumIterator;

use crate::collector::tools::ToolKind;
use crate::collector::{PluginsReport, QueueReport, ToolsReport};
use crate::display::{Page, grid, property_table, row};
use crate::format::{Tone, paint};

/// Rows kept in the category and update tables.
const TOP_PLUGIN_ROWS: usize = 10;

/// Example jobs listed per tool.
const TOOL_JOB_EXAMPLES: usize = 3;

fn count_tone(count: usize, warning: usize, error: usize) -> Tone {
    if count >= error {
        Tone::Error
    } else if count >= warning {
        Tone::Warning
    } else {
        Tone::Plain
    }
}

pub fn render_plugins(report: &PluginsReport) -> String {
    let rows = vec![
        ("Total Plugins", report.total_plugins.to_string()),
        ("Active Plugins", report.active_plugins.to_string()),
        (
            "Updates Available",
            paint(
                report.updates_available,
                count_tone(report.updates_available, 11, 21),
            ),
        ),
    ];

    let mut page = Page::new();
    page.table("Jenkins Plugins Summary", &property_table(["Metric", "Value"], rows));

    if !report.categories.is_empty() {
        let mut categories: Vec<_> = report.categories.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let title = if categories.len() > TOP_PLUGIN_ROWS {
            categories.truncate(TOP_PLUGIN_ROWS);
            "Top 10 Plugin Categories"
        } else {
            "Plugin Categories"
        };
        let mut table = grid(&["Category", "Count"]);
        for (category, count) in categories {
            table.add_row(row([category.clone(), count.to_string()]));
        }
        page.table(title, &table);
    }

    if !report.update_list.is_empty() {
        let total = report.update_list.len();
        let title = if total > TOP_PLUGIN_ROWS {
            format!("Plugin Updates Available (showing {TOP_PLUGIN_ROWS} of {total})")
        } else {
            "Plugin Updates Available".to_string()
        };
        let mut table = grid(&["Plugin", "Current Version", "New Version"]);
        for update in report.update_list.iter().take(TOP_PLUGIN_ROWS) {
            table.add_row(row([
                &update.name,
                &update.current_version,
                &update.new_version,
            ]));
        }
        page.table(&title, &table);
    }

    if !report.recent_plugins.is_empty() {
        let mut table = grid(&["Plugin", "Version"]);
        for plugin in &report.recent_plugins {
            table.add_row(row([&plugin.name, &plugin.version]));
        }
        page.table("Recently Installed/Updated Plugins", &table);
    }

    page.finish()
}

/// Hours are red, more than ten minutes is yellow.
fn wait_cell(wait_time: &str) -> String {
    let lower = wait_time.to_lowercase();
    let amount = lower
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<f64>().ok())
        .unwrap_or(0.0);
    if lower.contains("hour") {
        paint(wait_time, Tone::Error)
    } else if lower.contains("minute") && amount > 10.0 {
        paint(wait_time, Tone::Warning)
    } else {
        wait_time.to_string()
    }
}

pub fn render_queue(report: &QueueReport) -> String {
    let rows = vec![
        (
            "Items in Queue",
            paint(
                report.items_in_queue,
                count_tone(report.items_in_queue, 10, 20),
            ),
        ),
        ("Average Wait Time", report.avg_wait_time.clone()),
    ];

    let mut page = Page::new();
    page.table("Jenkins Queue Summary", &property_table(["Metric", "Value"], rows));

    if !report.blocking_reasons.is_empty() {
        let mut table = grid(&["Reason", "Count"]);
        for (reason, count) in &report.blocking_reasons {
            table.add_row(row([reason.clone(), count.to_string()]));
        }
        page.table("Blocking Reasons", &table);
    }

    if !report.items.is_empty() {
        let mut table = grid(&["Job Name", "Wait Time", "Blocking Reason", "Trigger Cause"]);
        for item in &report.items {
            table.add_row(row([
                item.job_name.clone(),
                wait_cell(&item.wait_time),
                item.why_blocked.clone(),
                item.cause.clone(),
            ]));
        }
        page.table("Queued Items", &table);
    }

    page.finish()
}

/// Tool summary, installations per kind, then tool usage in jobs.
pub fn render_tools(report: &ToolsReport) -> String {
    let mut rows = vec![("Total Tools".to_string(), report.total_tools().to_string())];
    for kind in ToolKind::iter() {
        let count = report.installations_of(kind).count();
        // Core kinds always listed, the rest only when configured.
        let core = matches!(
            kind,
            ToolKind::Jdk | ToolKind::Git | ToolKind::Maven | ToolKind::Ant | ToolKind::Gradle
        );
        if core || count > 0 {
            rows.push((kind.to_string(), count.to_string()));
        }
    }

    let mut summary = grid(&["Tool Type", "Count"]);
    for (kind, count) in rows {
        summary.add_row(row([kind, count]));
    }

    let mut page = Page::new();
    page.table("Jenkins Tools Summary", &summary);

    if report.uses_auto_install {
        page.line(format!(
            "\n{} {}",
            paint("Auto-installation:", Tone::Info),
            paint("Enabled", Tone::Success)
        ));
    }

    for kind in ToolKind::iter() {
        let tools: Vec<_> = report.installations_of(kind).collect();
        if tools.is_empty() {
            continue;
        }
        let with_version = tools.iter().any(|t| t.version.is_some());
        let mut headers = vec!["Name", "Path"];
        if with_version {
            headers.push("Version");
        }
        let mut table = grid(&headers);
        for tool in tools {
            let path = match (&tool.path, tool.auto_install) {
                (Some(path), _) => path.clone(),
                (None, true) => "Auto-installed".to_string(),
                (None, false) => "Default".to_string(),
            };
            let mut cells = vec![tool.name.clone(), path];
            if with_version {
                cells.push(tool.version.clone().unwrap_or_default());
            }
            table.add_row(row(cells));
        }
        page.table(&format!("{kind} Installations"), &table);
    }

    let used: Vec<_> = report
        .usage
        .iter()
        .filter(|(_, usage)| usage.job_count > 0)
        .collect();
    if !used.is_empty() {
        let mut table = grid(&["Tool", "Jobs", "Example Jobs"]);
        for (kind, usage) in used {
            let mut examples = usage
                .examples
                .iter()
                .take(TOOL_JOB_EXAMPLES)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if usage.job_count > TOOL_JOB_EXAMPLES {
                examples.push_str("...");
            }
            table.add_row(row([kind.to_string(), usage.job_count.to_string(), examples]));
        }
        page.table("Tool Usage in Jobs", &table);
    }

    page.finish()
}
