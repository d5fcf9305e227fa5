//! Console formatting helpers.
//!
//! Shared by collectors (which pre-format a few human strings such as wait
//! times) and by the display layer (colors, headers, percentages).
//!
//! Color output goes through [`paint`] so it can be switched off globally
//! with [`set_color_enabled`] (e.g. `--no-color` or piped output).

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, TimeZone};
use owo_colors::OwoColorize;

/// Width of the `=` banner printed by [`format_header`].
pub const HEADER_WIDTH: usize = 65;

static COLOR_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable or disable ANSI colors for everything rendered afterwards.
pub fn set_color_enabled(enabled: bool) {
    COLOR_ENABLED.store(enabled, Ordering::Relaxed);
}

#[cfg(test)]
thread_local! {
    static COLOR_OVERRIDE: std::cell::Cell<Option<bool>> = const { std::cell::Cell::new(None) };
}

/// Whether ANSI colors are currently emitted.
pub fn color_enabled() -> bool {
    #[cfg(test)]
    if let Some(enabled) = COLOR_OVERRIDE.with(|c| c.get()) {
        return enabled;
    }
    COLOR_ENABLED.load(Ordering::Relaxed)
}

/// Run `f` with colors pinned for the current thread. Takes precedence over
/// [`set_color_enabled`].
#[cfg(test)]
pub(crate) fn with_color<T>(enabled: bool, f: impl FnOnce() -> T) -> T {
    let previous = COLOR_OVERRIDE.with(|c| c.replace(Some(enabled)));
    let out = f();
    COLOR_OVERRIDE.with(|c| c.set(previous));
    out
}

/// Semantic color used when painting console text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Title,
    Success,
    Warning,
    Error,
    /// White on red, reserved for critical findings.
    Critical,
    Info,
    Disabled,
    Building,
    Plain,
}

/// Paint `text` with the given tone, or return it untouched when colors are off.
pub fn paint(text: impl Display, tone: Tone) -> String {
    if !color_enabled() {
        return text.to_string();
    }

    match tone {
        Tone::Header => text.blue().bold().to_string(),
        Tone::Title => text.cyan().bold().to_string(),
        Tone::Success => text.green().to_string(),
        Tone::Warning => text.yellow().to_string(),
        Tone::Error => text.red().to_string(),
        Tone::Critical => text.white().on_red().to_string(),
        Tone::Info => text.white().to_string(),
        Tone::Disabled => text.blue().to_string(),
        Tone::Building => text.cyan().to_string(),
        Tone::Plain => text.to_string(),
    }
}

// =============================================================================
// Durations & timestamps
// =============================================================================

/// Format a duration in milliseconds as `"12.3 sec"`, `"4.5 min"` or `"1.2 hrs"`.
pub fn format_duration(ms: f64) -> String {
    let seconds = ms / 1000.0;
    if seconds < 60.0 {
        format!("{seconds:.1} sec")
    } else if seconds < 3600.0 {
        format!("{:.1} min", seconds / 60.0)
    } else {
        format!("{:.1} hrs", seconds / 3600.0)
    }
}

/// Format a wait time in milliseconds as `"12.0 seconds"`, `"3.5 minutes"` or `"1.2 hours"`.
pub fn format_wait(ms: f64) -> String {
    if ms < 60_000.0 {
        format!("{:.1} seconds", ms / 1000.0)
    } else if ms < 3_600_000.0 {
        format!("{:.1} minutes", ms / 60_000.0)
    } else {
        format!("{:.1} hours", ms / 3_600_000.0)
    }
}

/// Compact uptime: `"2d 3h 4m"`, `"3h 4m"` or `"4m 5s"`.
pub fn format_uptime(ms: u64) -> String {
    let total = ms / 1000;
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Full uptime including every unit: `"2d 3h 4m 5s"`.
pub fn format_uptime_full(ms: u64) -> String {
    let total = ms / 1000;
    format!(
        "{}d {}h {}m {}s",
        total / 86_400,
        (total % 86_400) / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Format epoch milliseconds as local `%Y-%m-%d %H:%M:%S`, or `"N/A"` when out of range.
pub fn format_timestamp(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

// =============================================================================
// Sizes
// =============================================================================

/// Format a byte count with two decimals, scaling from B up to PB.
///
/// Zero prints as `"0 B"`.
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0.0 {
        return "0 B".to_string();
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Format a byte count for tables: whole bytes below 1 KB, otherwise two decimals up to TB.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;

    if bytes < 1024 {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.2} KB", b / KB)
    } else if b < KB.powi(3) {
        format!("{:.2} MB", b / KB.powi(2))
    } else if b < KB.powi(4) {
        format!("{:.2} GB", b / KB.powi(3))
    } else {
        format!("{:.2} TB", b / KB.powi(4))
    }
}

/// Convert bytes to gigabytes (binary).
pub fn bytes_to_gb(bytes: f64) -> f64 {
    bytes / 1024f64.powi(3)
}

// =============================================================================
// Percentages & statuses
// =============================================================================

/// Which direction of a percentage is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Success rates, availability.
    HigherIsBetter,
    /// Disk usage, utilization.
    LowerIsBetter,
}

fn percentage_tone(value: f64, polarity: Polarity) -> Tone {
    match polarity {
        Polarity::LowerIsBetter => {
            if value < 70.0 {
                Tone::Success
            } else if value < 85.0 {
                Tone::Warning
            } else if value < 95.0 {
                Tone::Error
            } else {
                Tone::Critical
            }
        }
        Polarity::HigherIsBetter => {
            if value > 90.0 {
                Tone::Success
            } else if value > 75.0 {
                Tone::Warning
            } else {
                Tone::Error
            }
        }
    }
}

/// Format a numeric percentage as `"85.5%"`, colored by polarity.
pub fn format_percentage(value: f64, polarity: Polarity) -> String {
    paint(format!("{value:.1}%"), percentage_tone(value, polarity))
}

/// Format a percentage that may already be a string.
///
/// Text that already carries a `%` keeps its exact wording, and text that is
/// not numeric (including previously colored output) is returned unchanged,
/// so applying this to its own output is a no-op.
pub fn format_percentage_text(text: &str, polarity: Polarity) -> String {
    let Ok(value) = text.trim_matches('%').trim().parse::<f64>() else {
        return text.to_string();
    };

    if text.contains('%') {
        paint(text, percentage_tone(value, polarity))
    } else {
        format_percentage(value, polarity)
    }
}

/// Color a node/job status keyword.
pub fn format_status(status: &str) -> String {
    let lower = status.to_lowercase();

    let tone = if matches!(lower.as_str(), "online" | "success") {
        Tone::Success
    } else if matches!(lower.as_str(), "offline" | "failed" | "failure") {
        Tone::Error
    } else if lower.contains("temporarily") || lower == "unstable" {
        Tone::Warning
    } else if lower == "disabled" {
        Tone::Disabled
    } else if lower.contains("progress") || lower.contains("building") {
        Tone::Building
    } else if lower.contains("not built") {
        Tone::Info
    } else {
        return status.to_string();
    };

    paint(status, tone)
}

// =============================================================================
// Headers
// =============================================================================

/// Section banner: a line of `=`, the centered title, another line of `=`.
pub fn format_header(text: &str) -> String {
    let bar = "=".repeat(HEADER_WIDTH);
    let pad = " ".repeat(HEADER_WIDTH.saturating_sub(text.chars().count()) / 2);
    format!("\n{}\n", paint(format!("{bar}\n{pad}{text}\n{bar}"), Tone::Header))
}

/// Sub-section title, rendered as `"\nTitle:"`.
pub fn format_subheader(text: &str) -> String {
    format!("\n{}", paint(format!("{text}:"), Tone::Title))
}

/// Render a failed section line: `"Error: <message>"` in red.
pub fn format_error(message: impl Display) -> String {
    paint(format!("Error: {message}"), Tone::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration(1_500.0), "1.5 sec");
        assert_eq!(format_duration(90_000.0), "1.5 min");
        assert_eq!(format_duration(5_400_000.0), "1.5 hrs");
    }

    #[test]
    fn test_format_wait_units() {
        assert_eq!(format_wait(30_000.0), "30.0 seconds");
        assert_eq!(format_wait(120_000.0), "2.0 minutes");
        assert_eq!(format_wait(7_200_000.0), "2.0 hours");
    }

    #[test]
    fn test_format_uptime_variants() {
        assert_eq!(format_uptime(65_000), "1m 5s");
        assert_eq!(format_uptime(3_660_000), "1h 1m");
        assert_eq!(format_uptime(90_061_000), "1d 1h 1m");
        assert_eq!(format_uptime_full(90_061_000), "1d 1h 1m 1s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0.0), "0 B");
        assert_eq!(format_bytes(512.0), "512.00 B");
        assert_eq!(format_bytes(1536.0), "1.50 KB");
        assert_eq!(format_bytes(1024f64.powi(5) * 2.0), "2.00 PB");
        // PB is the ceiling
        assert_eq!(format_bytes(1024f64.powi(6)), "1024.00 PB");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_format_timestamp_invalid() {
        assert_eq!(format_timestamp(i64::MAX), "N/A");
        assert_eq!(format_timestamp(0).len(), "1970-01-01 00:00:00".len());
    }

    // =========================================================================
    // Percentages
    // =========================================================================

    #[test]
    fn test_percentage_tones() {
        assert_eq!(percentage_tone(50.0, Polarity::LowerIsBetter), Tone::Success);
        assert_eq!(percentage_tone(80.0, Polarity::LowerIsBetter), Tone::Warning);
        assert_eq!(percentage_tone(90.0, Polarity::LowerIsBetter), Tone::Error);
        assert_eq!(percentage_tone(95.0, Polarity::LowerIsBetter), Tone::Critical);

        assert_eq!(percentage_tone(95.0, Polarity::HigherIsBetter), Tone::Success);
        assert_eq!(percentage_tone(80.0, Polarity::HigherIsBetter), Tone::Warning);
        assert_eq!(percentage_tone(75.0, Polarity::HigherIsBetter), Tone::Error);
    }

    #[test]
    fn test_format_percentage_text_keeps_wording() {
        let out = format_percentage_text("85.50%", Polarity::HigherIsBetter);
        assert!(out.contains("85.50%"));

        let out = format_percentage_text("42", Polarity::HigherIsBetter);
        assert!(out.contains("42.0%"));
    }

    #[test]
    fn test_format_percentage_text_non_numeric() {
        assert_eq!(
            format_percentage_text("Unknown", Polarity::LowerIsBetter),
            "Unknown"
        );
    }

    #[test]
    fn test_format_percentage_idempotent() {
        for color in [false, true] {
            with_color(color, || {
                for input in ["12.5%", "99.9%", "70", "n/a"] {
                    for polarity in [Polarity::HigherIsBetter, Polarity::LowerIsBetter] {
                        let once = format_percentage_text(input, polarity);
                        let twice = format_percentage_text(&once, polarity);
                        assert_eq!(once, twice, "input {input:?}, color {color}");
                    }
                }
            });
        }
    }

    #[test]
    fn test_format_status_passthrough() {
        with_color(true, || {
            assert_eq!(format_status("Mystery"), "Mystery");
            let online = format_status("Online");
            assert!(online.contains("Online"));
            assert_ne!(online, "Online");
        });
        with_color(false, || assert_eq!(format_status("Online"), "Online"));
    }

    #[test]
    fn test_color_override_is_scoped() {
        with_color(false, || {
            assert!(!color_enabled());
            with_color(true, || assert!(color_enabled()));
            assert!(!color_enabled());
        });
    }

    #[test]
    fn test_format_header_layout() {
        let header = format_header("JENKINS");
        assert!(header.contains(&"=".repeat(HEADER_WIDTH)));
        assert!(header.contains(&format!("{}JENKINS", " ".repeat(29))));
    }

    #[test]
    fn test_format_subheader() {
        assert!(format_subheader("Jenkins Queue Summary").contains("Jenkins Queue Summary:"));
    }
}
