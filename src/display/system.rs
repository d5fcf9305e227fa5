//! System, instance information, disk and hardware renderers.

use crate::client::html::UNKNOWN;
use crate::collector::hardware::NodeHardware;
use crate::collector::{DiskReport, HardwareReport, InfoReport, SystemReport};
use crate::display::{DisplayOptions, Page, grid, or_unknown, property_table, row, yes_no};
use crate::format::{Polarity, Tone, format_bytes, format_percentage, format_size, paint};

/// Width of the disk usage bar.
const BAR_LENGTH: usize = 50;

/// Drop rows whose value is unknown or empty.
fn known<'a>(rows: Vec<(&'a str, String)>) -> Vec<(&'a str, String)> {
    rows.into_iter()
        .filter(|(_, v)| !v.is_empty() && v != UNKNOWN)
        .collect()
}

pub fn render_system(report: &SystemReport) -> String {
    let status = if report.mode == "QUIET" { "Quiet" } else { "Active" };
    let rows = known(vec![
        ("Jenkins Version", report.version.clone()),
        ("System Status", status.to_string()),
        ("Security Enabled", yes_no(report.use_security)),
        ("Uptime", report.uptime.clone()),
        ("Java Version", report.java_version.clone()),
        (
            "Operating System",
            format!("{} {}", report.os_name, report.os_version).trim().to_string(),
        ),
        ("OS Architecture", report.os_arch.clone()),
        ("Jenkins Home", report.jenkins_home.clone()),
        ("Timezone", report.timezone.clone()),
        ("Primary View", report.primary_view.clone()),
        ("Total Views", report.views.to_string()),
    ]);

    Page::new()
        .table("Jenkins System Summary", &property_table(["Property", "Value"], rows))
        .finish()
}

pub fn render_info(report: &InfoReport) -> String {
    let csrf = match report.csrf_protection.as_str() {
        "Enabled" => paint("Enabled", Tone::Success),
        "Disabled" => paint("Disabled", Tone::Error),
        other => other.to_string(),
    };
    let rows = known(vec![
        ("Jenkins Version", report.version.clone()),
        ("Node Name", report.node_name.clone()),
        ("Node Description", report.node_description.clone()),
        ("Jenkins URL", report.url.clone()),
        ("Jenkins Home", report.jenkins_home.clone()),
        ("Jenkins WAR File", report.war_file.clone()),
        ("System Config File", report.config_file.clone()),
        ("Temp Directory", report.temp_dir.clone()),
        ("Log Level", report.log_level.clone()),
        ("Update Center URL", report.update_center_url.clone()),
        ("Agent Protocols", report.agent_protocols.clone()),
        ("Uptime", report.uptime.clone()),
        ("Startup Time", report.startup_time.clone()),
        ("Java Runtime", report.java_runtime.clone()),
        ("Java Version", report.java_version.clone()),
        ("Java Virtual Machine", report.java_vm.clone()),
        ("Java Home", report.java_home.clone()),
        ("Java Vendor", report.java_vendor.clone()),
        ("OS Name", report.os_name.clone()),
        ("OS Version", report.os_version.clone()),
        ("OS Architecture", report.os_arch.clone()),
        ("Timezone", report.timezone.clone()),
        ("Servlet Container", report.servlet_container.clone()),
        ("Servlet Version", report.servlet_version.clone()),
        ("Security Enabled", yes_no(report.use_security)),
        ("Security Realm", report.security_realm.clone()),
        ("Authorization Strategy", report.authorization_strategy.clone()),
        ("CSRF Protection", csrf),
        ("Running Mode", report.running_mode.clone()),
        ("Agent Port", report.agent_port.clone()),
        ("Primary View", report.primary_view.clone()),
        ("Total Views", report.views.to_string()),
    ]);

    Page::new()
        .table("Jenkins System Information", &property_table(["Property", "Value"], rows))
        .finish()
}

/// Usage bar: filled blocks colored by level, then empty blocks and the percentage.
pub fn disk_bar(usage_percent: f64) -> String {
    let clamped = usage_percent.clamp(0.0, 100.0);
    let used = ((BAR_LENGTH as f64) * clamped / 100.0) as usize;
    let tone = if usage_percent >= 90.0 {
        Tone::Critical
    } else if usage_percent >= 80.0 {
        Tone::Error
    } else if usage_percent >= 70.0 {
        Tone::Warning
    } else {
        Tone::Success
    };
    format!(
        "{}{} {usage_percent:.1}%",
        paint("█".repeat(used), tone),
        "░".repeat(BAR_LENGTH - used)
    )
}

pub fn render_disk(report: &DiskReport) -> String {
    let mut rows = vec![
        ("Total Disk Space", format!("{:.2} GB", report.total_gb)),
        ("Used Disk Space", format!("{:.2} GB", report.used_gb)),
        ("Free Disk Space", format!("{:.2} GB", report.free_gb)),
        (
            "Usage Percentage",
            format_percentage(report.usage_percent, Polarity::LowerIsBetter),
        ),
    ];
    if let Some(size) = report.jenkins_home_size {
        rows.push(("JENKINS_HOME Size", format_size(size)));
    }
    if let Some(size) = report.job_disk_usage {
        rows.push(("Job Disk Usage", format_size(size)));
    }
    if let Some(size) = report.build_disk_usage {
        rows.push(("Build Disk Usage", format_size(size)));
    }

    Page::new()
        .table("Jenkins Disk Usage Summary", &property_table(["Metric", "Value"], rows))
        .line("\nDisk Usage:")
        .line(disk_bar(report.usage_percent))
        .finish()
}

fn optional_percent(value: Option<f64>) -> String {
    value.map_or_else(
        || UNKNOWN.to_string(),
        |v| format_percentage(v, Polarity::LowerIsBetter),
    )
}

fn hardware_row(node: &NodeHardware) -> Vec<String> {
    let status = if node.online {
        paint("Online", Tone::Success)
    } else {
        paint("Offline", Tone::Error)
    };
    vec![
        node.name.clone(),
        status,
        or_unknown(node.cpu_cores),
        or_unknown(node.cpu_load.map(|l| format!("{l:.2}"))),
        or_unknown(node.memory_total.map(|b| format_bytes(b as f64))),
        optional_percent(node.memory_usage_percent()),
        or_unknown(node.disk_total.map(|b| format_bytes(b as f64))),
        optional_percent(node.disk_usage_percent()),
        or_unknown(node.response_time_ms.map(|ms| format!("{ms:.0} ms"))),
    ]
}

pub fn render_hardware(report: &HardwareReport, opts: &DisplayOptions) -> String {
    let summary = &report.summary;
    let rows = vec![
        ("Total Nodes", summary.total_nodes.to_string()),
        ("Online Nodes", summary.online_nodes.to_string()),
        ("Offline Nodes", summary.offline_nodes.to_string()),
        ("Total CPU Cores", summary.total_cpu_cores.to_string()),
        ("Total Memory", format_bytes(summary.total_memory as f64)),
        ("Total Disk Space", format_bytes(summary.total_disk_space as f64)),
    ];

    let mut page = Page::new();
    page.table("Jenkins Hardware Summary", &property_table(["Metric", "Value"], rows));

    if report.nodes.is_empty() {
        page.message("No node hardware information available", Tone::Warning);
        return page.finish();
    }

    // Online first, then by name.
    let mut nodes: Vec<&NodeHardware> = report.nodes.iter().collect();
    nodes.sort_by(|a, b| b.online.cmp(&a.online).then_with(|| a.name.cmp(&b.name)));
    let (shown, note) = opts.limit(&nodes, "nodes");

    let mut table = grid(&[
        "Node Name",
        "Status",
        "CPU Cores",
        "CPU Load",
        "Memory",
        "Mem Usage",
        "Disk Space",
        "Disk Usage",
        "Response Time",
    ]);
    for node in shown {
        table.add_row(row(hardware_row(node)));
    }
    page.table("Node Hardware Details", &table).note(note);
    page.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::set_color_enabled;

    #[test]
    fn test_disk_bar() {
        set_color_enabled(false);
        let bar = disk_bar(50.0);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 25);
        assert_eq!(bar.chars().filter(|c| *c == '░').count(), 25);
        assert!(bar.ends_with(" 50.0%"));

        let full = disk_bar(120.0);
        assert_eq!(full.chars().filter(|c| *c == '█').count(), BAR_LENGTH);
    }

    #[test]
    fn test_render_disk() {
        set_color_enabled(false);
        let report = DiskReport {
            total_gb: 100.0,
            used_gb: 40.0,
            free_gb: 60.0,
            usage_percent: 40.0,
            jenkins_home_size: Some(2048),
            ..DiskReport::default()
        };
        let text = render_disk(&report);
        assert!(text.contains("Jenkins Disk Usage Summary:"));
        assert!(text.contains("60.00 GB"));
        assert!(text.contains("JENKINS_HOME Size"));
        assert!(!text.contains("Job Disk Usage"));
        assert!(text.contains("Disk Usage:\n"));
    }

    #[test]
    fn test_render_system_hides_unknown() {
        set_color_enabled(false);
        let report = SystemReport {
            version: "2.440".into(),
            mode: "NORMAL".into(),
            use_security: true,
            java_version: UNKNOWN.into(),
            os_name: UNKNOWN.into(),
            os_version: String::new(),
            timezone: UNKNOWN.into(),
            ..SystemReport::default()
        };
        let text = render_system(&report);
        assert!(text.contains("2.440"));
        assert!(text.contains("| Security Enabled | Yes"));
        assert!(text.contains("Active"));
        assert!(!text.contains("Java Version"));
        assert!(!text.contains("Timezone"));
    }

    #[test]
    fn test_render_hardware_empty_nodes() {
        set_color_enabled(false);
        let text = render_hardware(&HardwareReport::default(), &DisplayOptions::default());
        assert!(text.contains("Jenkins Hardware Summary:"));
        assert!(text.contains("No node hardware information available"));
    }
}
