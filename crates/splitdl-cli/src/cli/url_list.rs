//! `--list FILE`: one URL per line.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read URL list {}", path.display()))?;
    Ok(parse_url_list(&text))
}

/// Trimmed non-empty lines, skipping `#` comments.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
