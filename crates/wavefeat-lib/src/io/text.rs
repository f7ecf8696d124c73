use crate::signal::WaveformSeries;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<WaveformSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).map(WaveformSeries::new)
}

/// Render samples one per line, the inverse of [`parse_f64_series`].
pub fn format_f64_series(series: &WaveformSeries) -> String {
    let mut out = String::with_capacity(series.len() * 8);
    for value in &series.data {
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let parsed = parse_f64_series("# pressure\n80.0\n\n 95.5 \n120\n").unwrap();
        assert_eq!(parsed, vec![80.0, 95.5, 120.0]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("80\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_f64_series("# only a comment\n").is_err());
    }

    #[test]
    fn reads_back_what_it_formats() {
        let series = WaveformSeries::new(vec![80.0, 101.25, -3.5]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pressure.txt");
        std::fs::write(&path, format_f64_series(&series)).unwrap();
        assert_eq!(read_f64_series(&path).unwrap(), series);
    }
}
