//! Display Layer
//!
//! One `render_*` function per collector report. Renderers never print; they
//! return the finished text (subheaders plus `prettytable` grid tables) so the
//! dashboard decides where it goes and tests can inspect it.
//!
//! # Architecture
//!
//! - [`Page`]: small line buffer shared by all renderers
//! - [`grid`] / [`property_table`]: tables in the grid style (`+---+`, `===` under titles)
//! - [`DisplayOptions`]: row limit applied to long listings
//! - Colors go through [`crate::format::paint`] and honor the global switch

use std::fmt::Display;

use prettytable::{Cell, Row, Table, format};

use crate::collector::CollectorError;
use crate::format::{Tone, format_error, format_subheader, paint};

pub mod alerts;
pub mod config;
pub mod infra;
pub mod jobs;
pub mod nodes;
pub mod os;
pub mod security;
pub mod system;

pub use alerts::render_alerts;
pub use config::{render_email, render_notifications};
pub use infra::{render_plugins, render_queue, render_tools};
pub use jobs::{
    render_artifacts, render_build_stats, render_failed_jobs, render_job_types,
    render_jobs_overview, render_jobs_summary, render_recent_builds,
};
pub use nodes::{
    render_executors, render_labels, render_labels_distribution, render_node_details,
    render_nodes_overview, render_nodes_summary,
};
pub use os::{
    render_detailed_os_distribution, render_linux_details, render_os_details,
    render_os_distribution, render_os_summary,
};
pub use security::{render_ldap, render_security, render_users};
pub use system::{render_disk, render_hardware, render_info, render_system};

/// Default table row limit.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Options shared by every renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Rows printed before a listing is truncated.
    pub max_rows: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl DisplayOptions {
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// Leading slice of `items` that fits, plus the truncation note when some were cut.
    pub fn limit<'a, T>(&self, items: &'a [T], what: &str) -> (&'a [T], Option<String>) {
        if items.len() <= self.max_rows {
            return (items, None);
        }
        let note = format!(
            "(showing first {} of {} {what})",
            self.max_rows,
            items.len()
        );
        (&items[..self.max_rows], Some(paint(note, Tone::Info)))
    }
}

/// Render a failed section as `"Error: <message>"`.
pub fn render_error(err: &CollectorError) -> String {
    format_error(err)
}

// =============================================================================
// Building blocks
// =============================================================================

/// Accumulates rendered lines.
#[derive(Debug, Default)]
pub(crate) struct Page {
    lines: Vec<String>,
}

impl Page {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn line(&mut self, text: impl Display) -> &mut Self {
        self.lines.push(text.to_string());
        self
    }

    pub(crate) fn subheader(&mut self, title: &str) -> &mut Self {
        self.line(format_subheader(title))
    }

    /// A titled table.
    pub(crate) fn table(&mut self, title: &str, table: &Table) -> &mut Self {
        self.subheader(title);
        self.line(table.to_string().trim_end())
    }

    /// Optional trailing note, usually from [`DisplayOptions::limit`].
    pub(crate) fn note(&mut self, note: Option<String>) -> &mut Self {
        if let Some(note) = note {
            self.line(note);
        }
        self
    }

    /// A highlighted message line, preceded by a blank line.
    pub(crate) fn message(&mut self, text: impl Display, tone: Tone) -> &mut Self {
        self.line(format!("\n{}", paint(text, tone)))
    }

    pub(crate) fn finish(&self) -> String {
        self.lines.join("\n")
    }
}

/// Empty grid table with a title row.
pub(crate) fn grid<S: AsRef<str>>(headers: &[S]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_DEFAULT);
    table.set_titles(Row::new(
        headers.iter().map(|h| Cell::new(h.as_ref())).collect(),
    ));
    table
}

/// One table row from displayable cells.
pub(crate) fn row<I, S>(cells: I) -> Row
where
    I: IntoIterator<Item = S>,
    S: Display,
{
    Row::new(cells.into_iter().map(|c| Cell::new(&c.to_string())).collect())
}

/// Two-column table of `(label, value)` pairs.
pub(crate) fn property_table<'a>(
    headers: [&str; 2],
    rows: impl IntoIterator<Item = (&'a str, String)>,
) -> Table {
    let mut table = grid(&headers);
    for (label, value) in rows {
        table.add_row(row([label.to_string(), value]));
    }
    table
}

/// Value or `"Unknown"`.
pub(crate) fn or_unknown<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "Unknown".to_string(), |v| v.to_string())
}

pub(crate) fn yes_no(value: bool) -> String {
    if value {
        paint("Yes", Tone::Success)
    } else {
        paint("No", Tone::Error)
    }
}

pub(crate) fn enabled_disabled(value: bool) -> String {
    if value {
        paint("Enabled", Tone::Success)
    } else {
        paint("Disabled", Tone::Error)
    }
}
