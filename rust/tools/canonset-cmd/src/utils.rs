//! Common utilities for canonset-cmd

use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the log subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parses hex input, ignoring surrounding whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).with_context(|| format!("Invalid hex input: {input}"))
}

fn parse_id(token: &str) -> Result<u64> {
    let token = token.trim();
    let parsed = match token.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(&digits.replace('_', ""), 16),
        None => token.replace('_', "").parse(),
    };
    parsed.with_context(|| format!("Invalid identifier: {token}"))
}

/// Parses `id`, `a..b` (exclusive) or `a..=b` (inclusive) into an inclusive range.
/// An empty exclusive range yields `None`.
pub fn parse_id_range(token: &str) -> Result<Option<RangeInclusive<u64>>> {
    let token = token.trim();
    if let Some((start, end)) = token.split_once("..=") {
        let (start, end) = (parse_id(start)?, parse_id(end)?);
        anyhow::ensure!(start <= end, "Range start exceeds its end: {token}");
        return Ok(Some(start..=end));
    }
    if let Some((start, end)) = token.split_once("..") {
        let (start, end) = (parse_id(start)?, parse_id(end)?);
        anyhow::ensure!(start <= end, "Range start exceeds its end: {token}");
        return Ok((start < end).then(|| start..=end - 1));
    }
    let id = parse_id(token)?;
    Ok(Some(id..=id))
}

/// Formats an inclusive range the way [`parse_id_range`] reads it back.
pub fn format_range(range: &RangeInclusive<u64>) -> String {
    if range.start() == range.end() {
        range.start().to_string()
    } else {
        format!("{}..={}", range.start(), range.end())
    }
}
