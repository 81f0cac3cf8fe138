//! Command implementations for canonset-cmd

use anyhow::{Context, Result};
use canonset::DecodedSet;

pub mod decode;
pub mod encode;
pub mod inspect;
pub mod validate;

use crate::utils::parse_hex;

/// Decodes a hex string into a set, attaching the input length to any error.
pub fn decode_hex(input: &str) -> Result<(Vec<u8>, DecodedSet)> {
    let bytes = parse_hex(input)?;
    let set = canonset::decode(&bytes)
        .with_context(|| format!("Failed to decode {} bytes", bytes.len()))?;
    Ok((bytes, set))
}
