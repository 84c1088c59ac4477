//! Human-readable sizes, rates and durations for the progress line.

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

pub fn format_bytes(bytes: u64) -> String {
    if bytes < KIB {
        format!("{}B", bytes)
    } else if bytes < MIB {
        format!("{:.1}K", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.1}M", bytes as f64 / MIB as f64)
    } else {
        format!("{:.1}G", bytes as f64 / GIB as f64)
    }
}

pub fn format_speed(bytes_per_sec: u64) -> String {
    if bytes_per_sec < KIB {
        format!("{}B", bytes_per_sec)
    } else if bytes_per_sec < MIB {
        format!("{:.0}K", bytes_per_sec as f64 / KIB as f64)
    } else {
        format!("{:.0}M", bytes_per_sec as f64 / MIB as f64)
    }
}

pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0s".to_string();
    }
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m{:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h{:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Shorten `name` to at most `max_width` chars with a middle ellipsis.
/// Below 8 columns the name is simply cut.
pub fn truncate_filename(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        return name.to_string();
    }
    if max_width < 8 {
        return chars[..max_width].iter().collect();
    }
    let head = (max_width - 3) / 2;
    let tail = max_width - 3 - head;
    let mut out: String = chars[..head].iter().collect();
    out.push_str("...");
    out.extend(&chars[chars.len() - tail..]);
    out
}
