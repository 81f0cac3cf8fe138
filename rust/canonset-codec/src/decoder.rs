//! Parsing of the canonical byte form.
//!
//! Decoding is all-or-nothing: any malformed or non-canonical input yields an
//! error and no partial set. Structure counts claimed by the input are checked
//! against the [`CapacityLimits`] before anything is materialized for them.

use canonset_bits::BitReader;
use canonset_common::{Result, error::Error, verify_canon, verify_data};
use canonset_format::{CduType, FormatSpec, SegmentKind, TokenTag};

use crate::{
    canon,
    decoded::{CapacityLimits, DecodedSet, StagedPartition, StagedSegment},
    tokens::{Chunk, TokenKey},
};

/// Decodes `bytes` with default capacity limits.
pub fn decode(bytes: &[u8]) -> Result<DecodedSet> {
    decode_with_limits(bytes, CapacityLimits::default())
}

/// Decodes `bytes`, failing with a capacity error if the encoded structure
/// exceeds `limits`.
pub fn decode_with_limits(bytes: &[u8], limits: CapacityLimits) -> Result<DecodedSet> {
    let result = decode_set(bytes, limits).and_then(|set| {
        canon::validate(&set)?;
        Ok(set)
    });
    if let Err(e) = &result {
        if e.is_canon_violation() {
            log::warn!("rejected non-canonical encoding ({} bytes): {e}", bytes.len());
        } else {
            log::debug!("rejected encoding ({} bytes): {e}", bytes.len());
        }
    }
    result
}

impl DecodedSet {
    pub fn decode(bytes: &[u8]) -> Result<DecodedSet> {
        decode(bytes)
    }

    pub fn decode_with_limits(bytes: &[u8], limits: CapacityLimits) -> Result<DecodedSet> {
        decode_with_limits(bytes, limits)
    }
}

fn decode_set(bytes: &[u8], limits: CapacityLimits) -> Result<DecodedSet> {
    let mut reader = BitReader::new(bytes);
    // Every version starts with the same version field.
    let version = CduType::DEFAULT.read(&mut reader)?;
    let format = FormatSpec::lookup(version)?;
    let fields = &format.fields;

    let mut set = DecodedSet::with_format(format, limits);
    let partition_count = fields.partition_count.read(&mut reader)?;
    set.check_growth(partition_count as usize, 0, 0)?;

    let max_partition = format.partition_len() - 1;
    let mut prev_id: Option<u64> = None;
    for _ in 0..partition_count {
        let delta = fields.partition_delta.read(&mut reader)?;
        let id = match prev_id {
            None => delta,
            Some(prev) => prev + 1 + delta,
        };
        if id > max_partition || id > u32::MAX as u64 {
            return Err(Error::canon_violation(
                "partition_delta",
                format!("partition id {id} out of range"),
            ));
        }
        let partition = read_partition(&mut reader, &set, format, id as u32)?;
        set.push_staged(partition)?;
        prev_id = Some(id);
    }

    let padding = (8 - reader.position() % 8) % 8;
    let pad_bits = reader
        .read(padding as u32)
        .ok_or_else(|| Error::truncated("padding"))?;
    verify_canon!(padding, pad_bits == 0);
    if reader.remaining() != 0 {
        return Err(Error::malformed(
            "trailing",
            format!("{} bytes after the last partition", reader.remaining() / 8),
        ));
    }
    log::trace!(
        "decoded {} bytes: {} partitions, {} segments, {} chunks",
        bytes.len(),
        set.partition_count(),
        set.segment_count(),
        set.chunk_count()
    );
    Ok(set)
}

fn read_partition(
    reader: &mut BitReader,
    set: &DecodedSet,
    format: &FormatSpec,
    id: u32,
) -> Result<StagedPartition> {
    let fields = &format.fields;
    let segment_count = fields.segment_count.read(reader)?;
    verify_canon!(segment_count, segment_count >= 1);
    set.check_growth(1, segment_count as usize, 0)?;

    let mut segments = Vec::new();
    let mut chunk_total = 0usize;
    let mut prev_end: Option<u64> = None;
    for _ in 0..segment_count {
        let kind = SegmentKind::from_bit(
            reader
                .read_bit()
                .ok_or_else(|| Error::truncated("segment_kind"))?,
        );
        let start_delta = fields.start_delta.read(reader)?;
        let start = match prev_end {
            None => start_delta,
            Some(end) => {
                verify_canon!(start_delta, start_delta >= 1);
                end + start_delta
            }
        };
        let len = fields.length.read(reader)? + 1;
        if start + len > format.partition_len() {
            return Err(Error::canon_violation(
                "segment",
                format!("segment {start}+{len} exceeds partition {id}"),
            ));
        }

        let segment = match kind {
            SegmentKind::Uniform => {
                let bit = reader
                    .read_bit()
                    .ok_or_else(|| Error::truncated("membership_bit"))?;
                verify_canon!(membership_bit, bit == format.rare_bit());
                StagedSegment {
                    start,
                    len,
                    kind,
                    chunks: Vec::new(),
                    cardinality: len,
                }
            }
            SegmentKind::Mixed => {
                verify_canon!(length, len <= format.max_segment_len_hint);
                let chunk_count = format.chunk_count(len) as usize;
                chunk_total += chunk_count;
                set.check_growth(1, segment_count as usize, chunk_total)?;
                let chunks = read_tokens(reader, format, len, chunk_count)?;
                StagedSegment {
                    start,
                    len,
                    kind,
                    cardinality: chunks.iter().map(|c| c.popcount() as u64).sum(),
                    chunks,
                }
            }
        };
        prev_end = Some(start + len);
        segments.push(segment);
    }
    Ok(StagedPartition { id, segments })
}

/// Reads the token stream of a mixed segment of `len` bits.
fn read_tokens(
    reader: &mut BitReader,
    format: &FormatSpec,
    len: u64,
    chunk_count: usize,
) -> Result<Vec<Chunk>> {
    let repeat_count = &format.fields.repeat_count;
    let mut chunks = Vec::with_capacity(chunk_count);
    let mut prev_key: Option<TokenKey> = None;
    while chunks.len() < chunk_count {
        let index = chunks.len();
        let tag = TokenTag::from_bits(CduType::TOKEN_TAG.read(reader)?)?;
        let key = match tag {
            TokenTag::Enumerated => {
                let field = CduType::POPCOUNT.read(reader)?;
                let k = (field & !TokenTag::ENUM_RUN_FLAG) as u32;
                let repeat = if field & TokenTag::ENUM_RUN_FLAG != 0 {
                    let repeat = repeat_count.read(reader)?;
                    verify_canon!(repeat_count, repeat >= 2);
                    repeat
                } else {
                    1
                };
                check_overrun(index, repeat, chunk_count)?;
                verify_canon!(popcount, format.is_enumerable(k));

                let first_width = format.chunk_width(len, index as u64);
                verify_canon!(popcount, k <= first_width);
                let rank = reader
                    .read(canonset_combinadic::rank_bits(first_width, k))
                    .ok_or_else(|| Error::truncated("rank"))?;
                for i in index..index + repeat as usize {
                    let width = format.chunk_width(len, i as u64);
                    if !canonset_combinadic::rank_valid(rank, width, k) || k > width {
                        return Err(Error::canon_violation(
                            "rank",
                            format!("rank {rank} invalid for {k} of {width} bits"),
                        ));
                    }
                    let bits = canonset_combinadic::unrank(rank, width, k)?;
                    chunks.push(Chunk::classify(bits, width, format)?);
                }
                TokenKey::Enumerated { popcount: k, rank }
            }
            TokenTag::Raw | TokenTag::RawRun => {
                let repeat = if tag == TokenTag::RawRun {
                    let repeat = repeat_count.read(reader)?;
                    verify_canon!(repeat_count, repeat >= 2);
                    repeat
                } else {
                    1
                };
                check_overrun(index, repeat, chunk_count)?;
                for i in index..index + repeat as usize {
                    let width = format.chunk_width(len, i as u64);
                    let bits = reader
                        .read(width)
                        .ok_or_else(|| Error::truncated("raw_chunk"))?;
                    if format.is_enumerable(bits.count_ones()) {
                        return Err(Error::canon_violation(
                            "raw_chunk",
                            format!(
                                "chunk with popcount {} must be enumerated",
                                bits.count_ones()
                            ),
                        ));
                    }
                    chunks.push(Chunk::classify(bits, width, format)?);
                }
                TokenKey::Raw
            }
        };
        canon::check_coalesced(prev_key, key)?;
        prev_key = Some(key);
    }
    Ok(chunks)
}

fn check_overrun(index: usize, repeat: u64, chunk_count: usize) -> Result<()> {
    verify_data!(token, repeat <= (chunk_count - index) as u64);
    Ok(())
}
