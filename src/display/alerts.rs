//! Health report: alert tables and recommended actions.

use std::collections::BTreeSet;

use crate::alerts::{Alert, AlertSummary, recommendation};
use crate::display::{Page, grid, row};
use crate::format::{Tone, format_header, paint};

fn alert_table(alerts: &[Alert], kind: &str) -> prettytable::Table {
    let mut table = grid(&["Category", kind, "Details", "Impact"]);
    for alert in alerts {
        table.add_row(row([
            format!("{} {}", alert.icon, alert.category),
            alert.message.clone(),
            alert.details.clone(),
            alert.impact.to_string(),
        ]));
    }
    table
}

pub fn render_alerts(summary: &AlertSummary) -> String {
    let mut page = Page::new();
    page.line(format_header("JENKINS SYSTEM HEALTH"));

    if summary.is_empty() {
        page.line(paint(
            "✅ GOOD - No alerts or warnings detected",
            Tone::Success,
        ));
        return page.finish();
    }

    if summary.critical_count > 0 {
        page.line(paint(
            format!(
                "❗ CRITICAL ISSUES DETECTED: {} critical alerts",
                summary.critical_count
            ),
            Tone::Critical,
        ));
    }
    if summary.warning_count > 0 {
        page.line(paint(
            format!("⚠️ WARNINGS DETECTED: {} warnings", summary.warning_count),
            Tone::Warning,
        ));
    }
    page.line(format!("Total: {} issues found", summary.total_count));

    if !summary.critical_alerts.is_empty() {
        page.line(format!("\n{}", paint("CRITICAL ALERTS:", Tone::Critical)))
            .line(alert_table(&summary.critical_alerts, "Alert").to_string().trim_end());
    }
    if !summary.warnings.is_empty() {
        page.line(format!("\n{}", paint("WARNINGS:", Tone::Warning)))
            .line(alert_table(&summary.warnings, "Warning").to_string().trim_end());
    }

    // Categories sharing an action collapse into one line.
    let actions: BTreeSet<(&str, &str)> = summary
        .iter()
        .map(|alert| recommendation(alert.category))
        .collect();
    page.subheader("Recommended Actions");
    for (label, text) in actions {
        page.line(format!("• {}: {text}", paint(label, Tone::Info)));
    }

    page.finish()
}
