//! Operating system distribution renderers.

use std::collections::BTreeMap;

use crate::collector::{NodesReport, OsDetailReport};
use crate::display::{DisplayOptions, Page, grid, or_unknown, row};
use crate::format::Tone;

/// Two-column `(name, count)` table, most common first.
fn counts_table(headers: [&str; 2], counts: &BTreeMap<String, usize>) -> prettytable::Table {
    let mut entries: Vec<_> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let mut table = grid(&headers);
    for (name, count) in entries {
        table.add_row(row([name.clone(), count.to_string()]));
    }
    table
}

/// Node count per reported OS name.
pub fn render_os_distribution(report: &OsDetailReport) -> String {
    let mut table = grid(&["OS Type", "Count"]);
    for (name, count) in report.os_counts() {
        table.add_row(row([name, count.to_string()]));
    }

    let mut page = Page::new();
    page.table("OS Distribution", &table);

    let totals: Vec<_> = report.totals().into_iter().filter(|(_, n)| *n > 0).collect();
    if !totals.is_empty() {
        let mut table = grid(&["Category", "Nodes"]);
        for (category, count) in totals {
            table.add_row(row([category.to_string(), count.to_string()]));
        }
        page.table("OS Categories", &table);
    }
    page.finish()
}

/// Node count per detected OS version.
pub fn render_detailed_os_distribution(report: &NodesReport) -> String {
    Page::new()
        .table(
            "Detailed OS Distribution",
            &counts_table(["OS Version", "Count"], &report.os_distribution),
        )
        .finish()
}

/// Linux distributions and the per-node facts gathered for them.
pub fn render_linux_details(report: &OsDetailReport) -> String {
    let mut page = Page::new();
    if report.linux_distributions.is_empty() {
        return page.finish();
    }

    page.table(
        "Linux Distribution Details",
        &counts_table(["Distribution", "Count"], &report.linux_distributions),
    );

    let mut table = grid(&["Node Name", "OS", "Version", "Kernel", "Release"]);
    for node in report.linux_nodes() {
        let release = node
            .properties
            .get("lsb.release")
            .or_else(|| node.properties.get("lsb_release"))
            .or_else(|| node.properties.get("DISTRIB_RELEASE"));
        table.add_row(row([
            node.node_name.clone(),
            node.os_name.clone(),
            node.os_version.clone(),
            node.kernel_version.clone(),
            or_unknown(release),
        ]));
    }
    page.table("Linux Nodes", &table);
    page.finish()
}

/// Per-node OS table sorted by OS then node name.
pub fn render_os_details(report: &NodesReport, opts: &DisplayOptions) -> String {
    let mut rows: Vec<[String; 4]> = report
        .nodes
        .iter()
        .map(|node| {
            let full_name = &node.os.full_name;
            let architecture = node
                .architecture
                .as_deref()
                .map(|arch| arch.replace(full_name.as_str(), "").trim().to_string())
                .filter(|arch| !arch.is_empty());
            [
                node.name.clone(),
                full_name.clone(),
                or_unknown(architecture),
                node.jvm_version.clone(),
            ]
        })
        .collect();
    rows.sort_by(|a, b| a[1].cmp(&b[1]).then_with(|| a[0].cmp(&b[0])));
    let (shown, note) = opts.limit(&rows, "nodes");

    let mut table = grid(&["Node Name", "OS Version", "Architecture", "JVM Version"]);
    for cells in shown {
        table.add_row(row(cells.iter()));
    }

    let mut page = Page::new();
    page.table("Nodes OS Details", &table).note(note);
    page.finish()
}

/// Summary table of detected OS versions.
pub fn render_os_summary(report: &NodesReport) -> String {
    let mut page = Page::new();
    if report.os_distribution.is_empty() {
        page.message("No OS distribution data available", Tone::Warning);
    } else {
        page.line(counts_table(["OS Version", "Count"], &report.os_distribution).to_string().trim_end());
    }
    page.finish()
}
