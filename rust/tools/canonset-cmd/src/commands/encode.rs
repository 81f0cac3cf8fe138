//! Encode command implementation

use anyhow::{Context, Result};
use canonset::DecodedSet;
use std::ops::RangeInclusive;

use crate::utils::parse_id_range;

/// Run the encode command
pub fn run(ids: Vec<String>, file: Option<String>) -> Result<()> {
    let mut ranges = collect_ranges(ids.iter().map(String::as_str))?;

    if let Some(path) = file {
        let contents =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
        let lines = contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty());
        ranges.extend(collect_ranges(lines).with_context(|| format!("In file {path}"))?);
    }

    let set = DecodedSet::from_ranges(ranges).context("Failed to build the set")?;
    let bytes = canonset::encode(&set).context("Failed to encode the set")?;
    log::info!(
        "encoded {} ids in {} partitions as {} bytes",
        set.cardinality(),
        set.partition_count(),
        bytes.len()
    );
    println!("{}", hex::encode(bytes));
    Ok(())
}

fn collect_ranges<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<RangeInclusive<u64>>> {
    let mut ranges = Vec::new();
    for token in tokens.filter(|t| !t.trim().is_empty()) {
        ranges.extend(parse_id_range(token)?);
    }
    Ok(ranges)
}
