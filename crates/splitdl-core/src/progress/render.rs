//! Pure progress line layout: no terminal access, so it is testable as is.

use super::human::{format_bytes, format_duration, format_speed, truncate_filename};
use super::stats::ProgressStats;

/// Width constraints for the bar line.
#[derive(Debug, Clone, Copy)]
pub struct BarLayout {
    /// Terminal width in columns.
    pub width: usize,
    pub min_bar_width: usize,
    pub max_filename_width: usize,
}

fn eta_text(stats: &ProgressStats) -> String {
    match stats.eta_secs() {
        Some(secs) => format_duration(secs as i64),
        None => "0s".to_string(),
    }
}

/// Renders `NAME PCT%[====>   ] BYTES SPEED/s eta ETA`.
///
/// The bar takes what is left of `layout.width` after the numbers and the
/// (possibly truncated) filename, never less than `layout.min_bar_width`.
pub fn render_bar_line(layout: &BarLayout, filename: &str, stats: &ProgressStats) -> String {
    let percent = stats.percent();
    let bytes = format_bytes(stats.bytes_done);
    let speed = format_speed(stats.bytes_per_sec() as u64);
    let eta = eta_text(stats);

    let prefix = format!(" {:3}%[", percent);
    let suffix = format!("] {} {}/s eta {}", bytes, speed, eta);
    let fixed = (prefix.len() + suffix.len()) as i64;
    let avail = layout.width as i64 - fixed;
    let min_bar = layout.min_bar_width as i64;

    let mut max_name = layout.max_filename_width as i64;
    if avail < max_name + min_bar {
        max_name = (avail - min_bar).max(8);
    }
    let name = truncate_filename(filename, max_name as usize);

    let bar_width = (avail - name.chars().count() as i64).max(min_bar) as usize;
    let filled = (percent as usize * bar_width / 100).min(bar_width);
    let bar = if filled == bar_width {
        "=".repeat(filled)
    } else if filled > 0 {
        format!("{}>{}", "=".repeat(filled), " ".repeat(bar_width - filled - 1))
    } else {
        " ".repeat(bar_width)
    };

    format!("{}{}{}{}", name, prefix, bar, suffix)
}

/// Renders a self-contained log line for non-terminal output.
pub fn render_log_line(filename: &str, stats: &ProgressStats) -> String {
    format!(
        "PROGRESS {} {}/{} {}% {}/s eta {}",
        filename,
        stats.bytes_done,
        stats.total_bytes,
        stats.percent(),
        format_speed(stats.bytes_per_sec() as u64),
        eta_text(stats)
    )
}
