use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Parse one value per line, skipping blank lines and `#` comments.
fn parse_lines<T>(text: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val = trimmed
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("line {} is not {}: {} ({})", idx + 1, what, trimmed, e))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no {} values found", what);
    }
    Ok(out)
}

/// Parse newline-delimited floating point samples.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    parse_lines(text, "a number")
}

/// Read newline-delimited floating point samples from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse newline-delimited sample indices of events.
pub fn parse_event_indices(text: &str) -> Result<Vec<usize>> {
    parse_lines(text, "an integer index")
}

/// Read event sample indices from a file.
pub fn read_event_indices(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_event_indices(&text).with_context(|| format!("parsing {}", path.display()))
}
