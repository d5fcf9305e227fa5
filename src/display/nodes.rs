//! Node renderers: summary, overview, labels, executors and per-node details.

use std::collections::BTreeMap;

use crate::api::NodeStatus;
use crate::collector::nodes::NodeRow;
use crate::collector::{
    ExecutorsReport, LabelsReport, NodeDetailsReport, NodesReport, NodesSummaryReport,
};
use crate::display::{DisplayOptions, Page, grid, or_unknown, property_table, row};
use crate::format::{Polarity, Tone, format_bytes, format_percentage, format_status, paint};

const BAR_LENGTH: usize = 50;

/// Example jobs listed per label.
const LABEL_JOB_EXAMPLES: usize = 3;

fn status_rank(status: NodeStatus) -> u8 {
    match status {
        NodeStatus::Online => 0,
        NodeStatus::TemporarilyOffline => 1,
        NodeStatus::Offline => 2,
    }
}

/// `(name, count)` pairs sorted by count, largest first.
fn by_count(map: &BTreeMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

fn count_table(headers: [&str; 2], map: &BTreeMap<String, usize>) -> prettytable::Table {
    let mut table = grid(&headers);
    for (name, count) in by_count(map) {
        table.add_row(row([name.clone(), count.to_string()]));
    }
    table
}

fn os_family_cell(name: &str) -> String {
    match name {
        "Windows" => paint(name, Tone::Info),
        "Linux" => paint(name, Tone::Success),
        "Mac" => paint(name, Tone::Warning),
        other => other.to_string(),
    }
}

pub fn render_nodes_summary(report: &NodesSummaryReport) -> String {
    let status = &report.status;
    let rows = vec![
        ("Total Nodes", report.total_nodes.to_string()),
        ("Online", paint(status.online, Tone::Success)),
        ("Offline", paint(status.offline, Tone::Error)),
        ("Temporarily Offline", paint(status.temp_offline, Tone::Warning)),
        ("Total Executors", report.total_executors.to_string()),
        ("Busy Executors", report.busy_executors.to_string()),
        ("Idle Executors", report.idle_executors.to_string()),
        (
            "Executor Utilization",
            format_percentage(report.executor_utilization, Polarity::LowerIsBetter),
        ),
        ("Total Labels", report.total_labels.to_string()),
    ];

    let mut page = Page::new();
    page.table("Jenkins Nodes Summary", &property_table(["Metric", "Value"], rows));

    if !report.os_families.is_empty() {
        let mut table = grid(&["OS Type", "Count"]);
        for (family, count) in by_count(&report.os_families) {
            table.add_row(row([os_family_cell(family), count.to_string()]));
        }
        page.table("OS Distribution", &table);
    }

    if !report.connection_types.is_empty() {
        page.table(
            "Connection Types",
            &count_table(["Connection Type", "Count"], &report.connection_types),
        );
    }

    if report.total_nodes > 0 {
        let share = |n: usize| BAR_LENGTH * n / report.total_nodes;
        let (online, temp) = (share(status.online), share(status.temp_offline));
        let bar = format!(
            "{}{}{}",
            paint("█".repeat(online), Tone::Success),
            paint("█".repeat(temp), Tone::Warning),
            paint("█".repeat(BAR_LENGTH.saturating_sub(online + temp)), Tone::Error),
        );
        let legend = format!(
            "{} {} {}",
            paint(format!("■ Online ({})", status.online), Tone::Success),
            paint(format!("■ Temp Offline ({})", status.temp_offline), Tone::Warning),
            paint(format!("■ Offline ({})", status.offline), Tone::Error),
        );
        page.line("\nNode Status Distribution:").line(bar).line(legend);
    }

    page.finish()
}

fn node_row(node: &NodeRow) -> Vec<String> {
    let utilization = if node.num_executors > 0 {
        format!("{:.1}%", node.utilization())
    } else {
        "N/A".to_string()
    };
    let os = if node.os.full_name.is_empty() {
        or_unknown(node.architecture.as_deref())
    } else {
        node.os.full_name.clone()
    };
    vec![
        node.name.clone(),
        format_status(node.status.as_ref()),
        format!("{}/{}", node.busy_executors, node.num_executors),
        utilization,
        node.connection_type.clone(),
        or_unknown(node.disk_bytes.map(|b| format_bytes(b as f64))),
        os,
        or_unknown(node.response_time_ms.map(|ms| format!("{ms:.0} ms"))),
    ]
}

pub fn render_nodes_overview(report: &NodesReport, opts: &DisplayOptions) -> String {
    let counts = &report.status_counts;
    let utilization = if report.total_executors > 0 {
        format!("{:.1}%", report.executor_utilization())
    } else {
        "0%".to_string()
    };
    let rows = vec![
        ("Total Nodes", report.total_nodes().to_string()),
        ("Online Nodes", counts.online.to_string()),
        ("Offline Nodes", counts.offline.to_string()),
        ("Temporarily Offline Nodes", counts.temp_offline.to_string()),
        ("Total Executors", report.total_executors.to_string()),
        ("Busy Executors", report.busy_executors.to_string()),
        ("Idle Executors", report.idle_executors.to_string()),
        ("Executor Utilization", utilization),
    ];

    let mut page = Page::new();
    page.table("Jenkins Nodes Summary", &property_table(["Metric", "Value"], rows));

    let connection_types = report.connection_types();
    if !connection_types.is_empty() {
        page.table(
            "Connection Types Distribution",
            &count_table(["Connection Type", "Count"], &connection_types),
        );
    }

    if report.nodes.is_empty() {
        page.message("No nodes found", Tone::Warning);
        return page.finish();
    }

    let mut nodes: Vec<&NodeRow> = report.nodes.iter().collect();
    nodes.sort_by(|a, b| {
        status_rank(a.status)
            .cmp(&status_rank(b.status))
            .then_with(|| a.name.cmp(&b.name))
    });
    let (shown, note) = opts.limit(&nodes, "nodes");

    let mut table = grid(&[
        "Node Name",
        "Status",
        "Executors (Busy/Total)",
        "Utilization",
        "Type",
        "Disk Space",
        "OS",
        "Response Time",
    ]);
    for node in shown {
        table.add_row(row(node_row(node)));
    }
    page.table("Jenkins Nodes", &table).note(note);
    page.finish()
}

fn availability_cell(percent: f64) -> String {
    let text = format!("{percent:.1}%");
    if percent >= 90.0 {
        paint(text, Tone::Success)
    } else if percent >= 70.0 {
        paint(text, Tone::Warning)
    } else {
        paint(text, Tone::Error)
    }
}

/// Label distribution derived from the nodes overview.
pub fn render_labels_distribution(report: &NodesReport, opts: &DisplayOptions) -> String {
    struct Tally {
        nodes: usize,
        online: usize,
        executors: u32,
    }

    let mut tallies: Vec<(&String, Tally)> = report
        .all_labels
        .iter()
        .map(|label| {
            let carriers: Vec<&NodeRow> = report
                .nodes
                .iter()
                .filter(|n| n.labels.contains(label))
                .collect();
            let tally = Tally {
                nodes: carriers.len(),
                online: carriers
                    .iter()
                    .filter(|n| n.status == NodeStatus::Online)
                    .count(),
                executors: carriers.iter().map(|n| n.num_executors).sum(),
            };
            (label, tally)
        })
        .filter(|(_, t)| t.nodes > 0)
        .collect();

    let mut page = Page::new();
    if tallies.is_empty() {
        page.message("No label information available", Tone::Warning);
        return page.finish();
    }

    tallies.sort_by(|a, b| b.1.nodes.cmp(&a.1.nodes).then_with(|| a.0.cmp(b.0)));
    let (shown, note) = opts.limit(&tallies, "labels");

    let mut table = grid(&[
        "Label",
        "Nodes",
        "Online",
        "Offline",
        "Availability",
        "Total Executors",
    ]);
    for (label, t) in shown {
        table.add_row(row([
            label.to_string(),
            t.nodes.to_string(),
            t.online.to_string(),
            (t.nodes - t.online).to_string(),
            availability_cell(t.online as f64 / t.nodes as f64 * 100.0),
            t.executors.to_string(),
        ]));
    }
    page.table("Jenkins Node Labels Distribution", &table).note(note);
    page.finish()
}

/// Label statistics, node-to-label table and label usage in jobs.
pub fn render_labels(report: &LabelsReport, opts: &DisplayOptions) -> String {
    let mut page = Page::new();

    if report.labels.is_empty() {
        page.message("No label information available", Tone::Warning);
    } else {
        let mut labels: Vec<_> = report.labels.iter().collect();
        labels.sort_by(|a, b| b.node_count.cmp(&a.node_count).then_with(|| a.name.cmp(&b.name)));
        let (shown, note) = opts.limit(&labels, "labels");

        let mut table = grid(&[
            "Label",
            "Nodes",
            "Online",
            "Offline",
            "Node Avail",
            "Executors",
            "Online Exec",
            "Exec Util",
        ]);
        for label in shown {
            table.add_row(row([
                label.name.clone(),
                label.node_count.to_string(),
                label.online_nodes.to_string(),
                label.offline_nodes.to_string(),
                format_percentage(label.availability(), Polarity::HigherIsBetter),
                label.total_executors.to_string(),
                label.online_executors.to_string(),
                format_percentage(label.executor_utilization(), Polarity::HigherIsBetter),
            ]));
        }
        page.table("Jenkins Node Labels Distribution", &table).note(note);
    }

    if report.labeled_nodes.is_empty() {
        page.message("No node label information available", Tone::Warning);
    } else {
        let mut table = grid(&["Node Name", "Labels"]);
        for (node, labels) in &report.labeled_nodes {
            let labels = if labels.is_empty() {
                "No labels".to_string()
            } else {
                labels.join(", ")
            };
            table.add_row(row([node.clone(), labels]));
        }
        page.table("Node Labels", &table);
    }

    if !report.unlabeled_nodes.is_empty() {
        page.message(
            format!("Unlabeled Nodes ({}):", report.unlabeled_nodes.len()),
            Tone::Warning,
        )
        .line(report.unlabeled_nodes.join(", "));
    }

    let mut used: Vec<_> = report.labels.iter().filter(|l| !l.jobs.is_empty()).collect();
    if used.is_empty() {
        page.message(
            "No labels are explicitly used in job configurations",
            Tone::Warning,
        );
    } else {
        used.sort_by(|a, b| b.jobs.len().cmp(&a.jobs.len()).then_with(|| a.name.cmp(&b.name)));
        let mut table = grid(&["Label", "Nodes", "Jobs", "Example Jobs"]);
        for label in used {
            let mut examples = label
                .jobs
                .iter()
                .take(LABEL_JOB_EXAMPLES)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if label.jobs.len() > LABEL_JOB_EXAMPLES {
                examples.push_str("...");
            }
            table.add_row(row([
                label.name.clone(),
                label.node_count.to_string(),
                label.jobs.len().to_string(),
                examples,
            ]));
        }
        page.table("Label Usage in Jobs", &table);
    }

    page.finish()
}

pub fn render_executors(report: &ExecutorsReport) -> String {
    let mut page = Page::new();
    if report.nodes.is_empty() {
        page.message("No executor usage information available", Tone::Warning);
        return page.finish();
    }

    let rows = vec![
        ("Total Executors", report.total_executors.to_string()),
        ("Busy Executors", report.busy_executors.to_string()),
        ("Idle Executors", report.idle_executors.to_string()),
        (
            "Overall Utilization",
            format_percentage(report.overall_utilization, Polarity::LowerIsBetter),
        ),
    ];
    page.table("Executor Usage Summary", &property_table(["Metric", "Value"], rows));

    let mut table = grid(&["Node Name", "Busy/Total", "Utilization", "Most Running Job"]);
    for node in &report.nodes {
        table.add_row(row([
            node.node_name.clone(),
            format!("{}/{}", node.busy, node.total),
            format_percentage(node.utilization, Polarity::LowerIsBetter),
            node.most_running_job.clone(),
        ]));
    }
    page.table("Executor Usage By Node", &table);

    let utilization = report.overall_utilization;
    let used = (BAR_LENGTH as f64 * utilization.clamp(0.0, 100.0) / 100.0) as usize;
    let tone = if utilization >= 90.0 {
        Tone::Error
    } else if utilization >= 70.0 {
        Tone::Warning
    } else {
        Tone::Success
    };
    page.line("\nExecutor Utilization:")
        .line(format!(
            "{}{} {utilization:.1}%",
            paint("█".repeat(used), tone),
            "░".repeat(BAR_LENGTH - used)
        ))
        .line(format!(
            "{}   {}   {}",
            paint("■ High (>90%)", Tone::Error),
            paint("■ Medium (70-90%)", Tone::Warning),
            paint("■ Low (<70%)", Tone::Success),
        ));

    page.finish()
}

/// Whichever of the OS, hardware and software tables the report carries.
pub fn render_node_details(report: &NodeDetailsReport) -> String {
    let mut page = Page::new();

    if !report.os.is_empty() {
        let mut table = grid(&[
            "Node Name",
            "Machine Name",
            "IP Address",
            "OS Type",
            "OS Vendor",
            "OS Version",
        ]);
        for node in &report.os {
            table.add_row(row([
                &node.name,
                &node.machine_name,
                &node.ip_address,
                &node.os_type,
                &node.os_vendor,
                &node.os_version,
            ]));
        }
        page.table("Jenkins Nodes OS Information", &table);
    }

    if !report.hardware.is_empty() {
        let mut table = grid(&[
            "Node Name", "Vendor", "Model", "Type", "Serial", "CPU", "RAM", "Disk", "Swap",
        ]);
        for node in &report.hardware {
            table.add_row(row([
                &node.name,
                &node.vendor,
                &node.model,
                &node.kind,
                &node.serial,
                &node.cpu,
                &node.ram,
                &node.disk,
                &node.swap,
            ]));
        }
        page.table("Jenkins Nodes Hardware Information", &table);
    }

    if !report.software.is_empty() {
        let mut table = grid(&["Node Name", "JDK Version", "Agent Version", "Clock Difference"]);
        for node in &report.software {
            table.add_row(row([
                &node.name,
                &node.jdk,
                &node.agent_version,
                &node.clock_difference,
            ]));
        }
        page.table("Jenkins Nodes Software & System Information", &table);
    }

    if report.os.is_empty() && report.hardware.is_empty() && report.software.is_empty() {
        page.message("No node details available", Tone::Warning);
    }

    page.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::nodes::OsInfo;
    use crate::format::set_color_enabled;

    fn node(name: &str, status: NodeStatus, labels: &[&str], executors: u32) -> NodeRow {
        NodeRow {
            name: name.to_string(),
            description: String::new(),
            status,
            jvm_version: String::new(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            num_executors: executors,
            idle_executors: executors,
            busy_executors: 0,
            disk_bytes: None,
            disk_path: None,
            response_time_ms: None,
            architecture: None,
            os: OsInfo::unknown(),
            connection_type: "SSH".to_string(),
            last_connection: String::new(),
        }
    }

    fn report() -> NodesReport {
        NodesReport {
            total_executors: 6,
            nodes: vec![
                node("zeta", NodeStatus::Online, &["linux"], 2),
                node("alpha", NodeStatus::Offline, &["linux", "docker"], 2),
                node("beta", NodeStatus::TemporarilyOffline, &["linux"], 2),
            ],
            all_labels: ["linux", "docker", "unused"].iter().map(|s| s.to_string()).collect(),
            ..NodesReport::default()
        }
    }

    #[test]
    fn test_nodes_overview_sorted_by_status() {
        set_color_enabled(false);
        let text = render_nodes_overview(&report(), &DisplayOptions::default());
        let zeta = text.find("| zeta").unwrap();
        let beta = text.find("| beta").unwrap();
        let alpha = text.find("| alpha").unwrap();
        assert!(zeta < beta && beta < alpha);
        assert!(text.contains("Connection Types Distribution:"));
    }

    #[test]
    fn test_labels_distribution_from_nodes() {
        set_color_enabled(false);
        let text = render_labels_distribution(&report(), &DisplayOptions::default());
        assert!(text.contains("| linux  | 3     | 1      | 2       | 33.3%"));
        assert!(text.contains("| docker | 1     | 0      | 1       | 0.0%"));
        assert!(!text.contains("unused"));
    }

    #[test]
    fn test_labels_distribution_empty() {
        let text = render_labels_distribution(&NodesReport::default(), &DisplayOptions::default());
        assert!(text.contains("No label information available"));
    }

    #[test]
    fn test_render_node_details_empty() {
        let text = render_node_details(&NodeDetailsReport::default());
        assert!(text.contains("No node details available"));
    }
}
