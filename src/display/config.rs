//! Email and notification channel renderers.

use crate::collector::{EmailReport, NotificationsReport};
use crate::display::{Page, enabled_disabled, grid, property_table, row};
use crate::format::{Tone, paint};

fn enabled_or_warning(value: bool) -> String {
    if value {
        paint("Enabled", Tone::Success)
    } else {
        paint("Disabled", Tone::Warning)
    }
}

fn configured(value: bool) -> String {
    if value { "Configured" } else { "Not configured" }.to_string()
}

pub fn render_email(report: &EmailReport) -> String {
    let mut rows = vec![("Status", enabled_or_warning(report.enabled))];
    if report.extended_email {
        rows.push(("Extended Email", paint("Enabled", Tone::Success)));
    }
    let optional = [
        ("SMTP Server", &report.smtp_server),
        ("SMTP Port", &report.smtp_port),
    ];
    rows.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| value.clone().map(|v| (label, v))),
    );
    rows.push(("SMTP Authentication", enabled_disabled(report.smtp_auth)));
    let optional = [
        ("SMTP Username", &report.smtp_username),
        ("Default Email Suffix", &report.default_suffix),
        ("Admin Email", &report.admin_email),
        ("Reply-To Address", &report.reply_to),
        ("Content Type", &report.content_type),
    ];
    rows.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| value.clone().map(|v| (label, v))),
    );
    let test = if report.test_available { "Available" } else { "Not available" };
    rows.push(("Test Email Functionality", test.to_string()));

    let mut page = Page::new();
    page.table(
        "Jenkins Email Notification Settings",
        &property_table(["Setting", "Value"], rows),
    );

    if !report.triggers.is_empty() {
        page.subheader("Email Notification Triggers")
            .line(report.triggers.join(", "));
    }
    if !report.recipient_examples.is_empty() {
        page.subheader("Example Email Recipients")
            .line(report.recipient_examples.join(", "));
    }

    page.finish()
}

pub fn render_notifications(report: &NotificationsReport) -> String {
    let mut rows = vec![
        ("Slack", enabled_or_warning(report.slack.enabled)),
        ("Microsoft Teams", enabled_or_warning(report.teams.enabled)),
        ("Email", enabled_or_warning(report.email.enabled)),
    ];
    if !report.other.is_empty() {
        rows.push(("Other Systems", report.other.join(", ")));
    }

    let mut page = Page::new();
    page.table(
        "Jenkins Notification Systems",
        &property_table(["System", "Status"], rows),
    );

    let slack = &report.slack;
    if slack.enabled {
        let mut rows = Vec::new();
        if let Some(workspace) = &slack.workspace {
            rows.push(("Workspace", workspace.clone()));
        }
        if let Some(channel) = &slack.default_channel {
            rows.push(("Default Channel", channel.clone()));
        }
        rows.push(("Integration Token", configured(slack.token_configured)));
        if let Some(version) = &slack.version {
            rows.push(("Plugin Version", version.clone()));
        }
        page.table("Slack Configuration", &property_table(["Setting", "Value"], rows));
    }

    let teams = &report.teams;
    if teams.enabled {
        let mut rows = Vec::new();
        if let Some(webhook) = &teams.webhook {
            rows.push(("Webhook URL", webhook.clone()));
        }
        rows.push(("Webhook Status", configured(teams.webhook_configured)));
        if let Some(version) = &teams.version {
            rows.push(("Plugin Version", version.clone()));
        }
        page.table(
            "Microsoft Teams Configuration",
            &property_table(["Setting", "Value"], rows),
        );
    }

    let usage = &report.usage;
    if usage.total_jobs_checked > 0 {
        let total = usage.total_jobs_checked as f64;
        let mut table = grid(&["System", "Jobs", "Percentage"]);
        for (system, jobs) in [
            ("Slack", usage.slack),
            ("Microsoft Teams", usage.teams),
            ("Email", usage.email),
            ("Other", usage.other),
        ] {
            table.add_row(row([
                system.to_string(),
                jobs.to_string(),
                format!("{:.1}%", jobs as f64 / total * 100.0),
            ]));
        }
        page.table(
            &format!(
                "Notification Usage in Jobs (Sample of {} jobs)",
                usage.total_jobs_checked
            ),
            &table,
        );
    }

    page.finish()
}
