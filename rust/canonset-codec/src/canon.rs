//! Canonicity checks.
//!
//! The decoder enforces the local rules (minimal integers, tag values, token
//! coalescing, padding) while it reads. [`validate`] then re-derives the whole
//! layout from the decoded members and requires it to match what was read, which
//! rejects every well-formed stream the encoder would not have produced.

use canonset_common::{Result, error::Error};

use crate::{
    decoded::{DecodedSet, StagedPartition},
    decoder,
    tokens::TokenKey,
};

/// Checks that the stored layout of every partition is the one the encoder
/// derives from its members.
pub fn validate(set: &DecodedSet) -> Result<()> {
    let format = set.format();
    let mut prev_id: Option<u32> = None;
    for partition in set.partitions() {
        let id = partition.id();
        if prev_id.is_some_and(|prev| prev >= id) {
            return Err(Error::canon_violation(
                "partition",
                format!("partition {id} out of order"),
            ));
        }
        prev_id = Some(id);

        let runs = partition.runs();
        if runs.is_empty() {
            return Err(Error::canon_violation(
                "partition",
                format!("partition {id} has no members"),
            ));
        }

        let expected = StagedPartition::from_runs(id, &runs, format)?;
        if expected.segments.len() != partition.segment_count() {
            return Err(Error::canon_violation(
                "segment_count",
                format!(
                    "partition {id} stores {} segments, its members need {}",
                    partition.segment_count(),
                    expected.segments.len()
                ),
            ));
        }
        for (i, (stored, derived)) in partition.segments().zip(&expected.segments).enumerate() {
            let layout_matches = stored.start() == derived.start
                && stored.len() == derived.len
                && stored.kind() == derived.kind;
            if !layout_matches {
                return Err(Error::canon_violation(
                    "segment",
                    format!(
                        "partition {id} segment {i}: stored ({}, {}, {:?}), expected ({}, {}, {:?})",
                        stored.start(),
                        stored.len(),
                        stored.kind(),
                        derived.start,
                        derived.len,
                        derived.kind
                    ),
                ));
            }
            if stored.chunks() != derived.chunks.as_slice() {
                return Err(Error::canon_violation(
                    "chunk",
                    format!("partition {id} segment {i}: chunk tokens differ from derived ones"),
                ));
            }
            if stored.cardinality() != derived.cardinality {
                return Err(Error::canon_violation(
                    "segment",
                    format!("partition {id} segment {i}: cardinality mismatch"),
                ));
            }
        }
    }
    Ok(())
}

/// Decodes `bytes` and discards the result.
pub fn validate_encoding(bytes: &[u8]) -> Result<()> {
    decoder::decode(bytes).map(|_| ())
}

/// Rejects a token that repeats the coalescing key of the token before it.
pub(crate) fn check_coalesced(prev: Option<TokenKey>, key: TokenKey) -> Result<()> {
    match prev {
        Some(prev) if prev == key => Err(Error::canon_violation(
            "token",
            match key {
                TokenKey::Raw => "adjacent raw tokens must be one raw-run token".to_string(),
                TokenKey::Enumerated { popcount, rank } => format!(
                    "adjacent enumerated tokens (k={popcount}, rank={rank}) must be one run"
                ),
            },
        )),
        _ => Ok(()),
    }
}
