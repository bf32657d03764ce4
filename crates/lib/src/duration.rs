//! Parsing of human-readable relative-age expressions like "30d" or "4h".

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Parse a relative-age expression into fractional hours.
///
/// The accepted grammar is a non-negative integer immediately followed
/// by exactly one unit character: `h` (hours), `d` (days) or `m`
/// (minutes). No sign, no decimals, no whitespace.
pub fn parse_older_than(expr: &str) -> Result<f64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+)(h|d|m)$").expect("static regex must compile")
    });

    let captures = pattern
        .captures(expr)
        .ok_or_else(|| Error::InvalidFormat(expr.to_owned()))?;

    // A run of digits can still overflow; treat that as malformed too.
    let value: u64 = captures[1]
        .parse()
        .map_err(|_| Error::InvalidFormat(expr.to_owned()))?;
    let value = value as f64;

    let hours = match &captures[2] {
        "h" => value,
        "d" => value * 24.0,
        "m" => value / 60.0,
        _ => unreachable!("regex only admits h, d or m"),
    };

    Ok(hours)
}
