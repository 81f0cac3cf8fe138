//! Decode command implementation

use anyhow::Result;
use std::io::{BufWriter, Write};

use crate::{commands::decode_hex, utils::format_range};

/// Run the decode command
pub fn run(hex: String, ranges: bool) -> Result<()> {
    let (bytes, set) = decode_hex(&hex)?;
    log::info!(
        "decoded {} bytes into {} ids",
        bytes.len(),
        set.cardinality()
    );

    let mut out = BufWriter::new(std::io::stdout().lock());
    if ranges {
        for range in set.ranges() {
            writeln!(out, "{}", format_range(&range))?;
        }
    } else {
        for id in set.ids() {
            writeln!(out, "{id}")?;
        }
    }
    out.flush()?;
    Ok(())
}
