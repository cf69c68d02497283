use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use super::events::parse_timestamp;

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse numeric samples separated by newlines, commas or whitespace.
/// Blank lines and `#` comments are ignored.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (line_no, line) in content_lines(text) {
        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let val: f64 = token
                .parse()
                .with_context(|| format!("line {} is not f64: {}", line_no, token))?;
            out.push(val);
        }
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Parse one event date (or full timestamp) per line.
pub fn parse_dates(text: &str) -> Result<Vec<NaiveDate>> {
    content_lines(text)
        .map(|(line_no, line)| {
            parse_timestamp(line)
                .map(|ts| ts.date())
                .with_context(|| format!("line {} is not a date: {}", line_no, line))
        })
        .collect()
}
