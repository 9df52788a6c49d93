//! Positional output parsing
//!
//! Both parsers report an unusable line as `ParseAnomaly` instead of
//! guessing; the builder logs it and leaves the field at zero.

use crate::error::{Error, Result};

fn anomaly(line: &str, reason: &str) -> Error {
    Error::ParseAnomaly {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse one `wc -l` line into a child count
pub fn parse_child_count(line: &str) -> Result<u32> {
    let trimmed = line.trim();
    if !is_digits(trimmed) {
        return Err(anomaly(line, "not a number"));
    }
    trimmed
        .parse()
        .map_err(|_| anomaly(line, "count out of range"))
}

/// Parse one `stat -t` line into a byte size.
///
/// The line starts with the path exactly as passed to `stat`; the first
/// whitespace-delimited token after it is the size. Empty lines, the `0`
/// placeholder, lines shorter than the path and non-numeric tokens are
/// anomalies.
pub fn parse_stat_size(line: &str, path: &str) -> Result<u64> {
    if line.is_empty() || line == "0" {
        return Err(anomaly(line, "no stat output"));
    }
    if line.len() < path.len() {
        return Err(anomaly(line, "shorter than the path prefix"));
    }

    let rest = line
        .get(path.len()..)
        .ok_or_else(|| anomaly(line, "path prefix splits a character"))?;

    let token = rest.trim().split_whitespace().next().unwrap_or_default();
    if !is_digits(token) {
        return Err(anomaly(line, "size is not a number"));
    }
    token
        .parse()
        .map_err(|_| anomaly(line, "size out of range"))
}
