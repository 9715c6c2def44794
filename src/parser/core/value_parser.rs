//! Value parsing utilities for engine-formatted profile metrics
//!
//! The profile producer emits human-formatted values ("12.345ms", "1s570ms",
//! "3.2 GB"). Everything numeric in the analysis model goes through here so
//! that format drift upstream has exactly one patch point.

use crate::parser::error::{ParseError, ParseResult};
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_COMPONENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)\s*(ms|us|μs|ns|h|m|s)").unwrap());

// Supports "558.156 GB", "2.167KB", "1024B", "0.000 B"
static BYTES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d+\.?\d*)\s*(TB|GB|MB|KB|K|M|G|T|B)\b").unwrap());

/// Value parser for engine-formatted profile metrics
pub struct ValueParser;

impl ValueParser {
    /// Parse a formatted duration string to fractional milliseconds.
    ///
    /// Supports single- and multi-component formats: "123ms", "5.540us",
    /// "390ns", "3s", "1s570ms", "1h30m".
    pub fn parse_time_to_ms(input: &str) -> ParseResult<f64> {
        let input = input.trim();

        if input == "0" {
            return Ok(0.0);
        }

        let mut total_ms: f64 = 0.0;
        let mut found_any = false;

        for cap in TIME_COMPONENT_REGEX.captures_iter(input) {
            found_any = true;

            let num_str = cap.get(1).unwrap().as_str();
            let num: f64 = num_str.parse().map_err(|_| {
                ParseError::ParseDurationError(format!(
                    "invalid number '{}' in duration '{}'",
                    num_str, input
                ))
            })?;

            let unit = cap.get(2).unwrap().as_str();

            total_ms += match unit {
                "h" => num * 3_600_000.0,
                "m" => num * 60_000.0,
                "s" => num * 1_000.0,
                "ms" => num,
                "us" | "μs" => num / 1_000.0,
                "ns" => num / 1_000_000.0,
                _ => 0.0,
            };
        }

        if !found_any {
            return Err(ParseError::ParseDurationError(format!(
                "no valid time components found in '{}'",
                input
            )));
        }

        Ok(total_ms)
    }

    /// Fail-soft duration parse: absent or malformed input yields 0.0.
    ///
    /// This is the contract the tree builder and aggregator rely on:
    /// profiles are best-effort diagnostic exports that commonly omit
    /// fields, so a missing timing is data, not an error.
    pub fn duration_ms_or_zero(input: Option<&str>) -> f64 {
        input
            .and_then(|s| Self::parse_time_to_ms(s).ok())
            .unwrap_or(0.0)
    }

    /// Parse a formatted byte-size string ("45.907 GB", "2.167KB", "1024") to u64.
    pub fn parse_bytes(input: &str) -> ParseResult<u64> {
        let original = input.trim();
        let input = original.to_uppercase();

        if let Some(cap) = BYTES_REGEX.captures(&input) {
            let num_str = cap.get(1).unwrap().as_str().replace(",", "");
            let num: f64 = num_str.parse().map_err(|e| {
                ParseError::ParseBytesError(format!("invalid number '{}': {}", num_str, e))
            })?;

            let unit = cap.get(2).unwrap().as_str();

            let multiplier: f64 = match unit {
                "B" => 1.0,
                "K" | "KB" => 1024.0,
                "M" | "MB" => 1024.0 * 1024.0,
                "G" | "GB" => 1024.0 * 1024.0 * 1024.0,
                "T" | "TB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
                _ => {
                    return Err(ParseError::ParseBytesError(format!("unknown byte unit: {}", unit)));
                },
            };

            return Ok((num * multiplier).floor() as u64);
        }

        let temp = input.replace(",", "");
        let cleaned = temp.split_whitespace().next().unwrap_or(&input);
        cleaned.parse::<u64>().map_err(|e| {
            ParseError::ParseBytesError(format!("cannot parse bytes from '{}': {}", input, e))
        })
    }

    /// Fail-soft byte parse: absent or malformed input yields 0.
    pub fn bytes_or_zero(input: Option<&str>) -> u64 {
        input.and_then(|s| Self::parse_bytes(s).ok()).unwrap_or(0)
    }
}
