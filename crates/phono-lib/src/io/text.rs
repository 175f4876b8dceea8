use crate::signal::RRIntervals;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited floating point values, ignoring blank/comment lines.
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
    Ok(out)
}

/// Parse RR intervals (seconds, one per line); each must be finite and positive.
pub fn parse_rr_intervals(text: &str) -> Result<RRIntervals> {
    let rr = parse_f64_series(text)?;
    if let Some((idx, bad)) = rr
        .iter()
        .enumerate()
        .find(|(_, x)| !x.is_finite() || **x <= 0.0)
    {
        anyhow::bail!("RR interval #{} must be positive seconds, got {}", idx + 1, bad);
    }
    Ok(RRIntervals { rr })
}

/// Read RR intervals from disk.
pub fn read_rr_intervals(path: &Path) -> Result<RRIntervals> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rr_intervals(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let rr = parse_rr_intervals("# exported beats\n0.81\n\n  0.79 \n0.80\n").unwrap();
        assert_eq!(rr.rr, vec![0.81, 0.79, 0.80]);
    }

    #[test]
    fn empty_input_is_an_empty_series() {
        assert!(parse_rr_intervals("\n# nothing\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage_and_non_positive_values() {
        let err = parse_rr_intervals("0.8\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_rr_intervals("0.8\n0.0\n").is_err());
        assert!(parse_rr_intervals("-0.8\n").is_err());
    }
}
