//! Serialization of a [`DecodedSet`] into its canonical byte form.
//!
//! The stored layout is already canonical, so encoding only walks it: header,
//! partitions in ascending order, their segments, and the coalesced token stream
//! of every mixed segment. The same walk drives a bit counter for
//! [`DecodedSet::encoded_len`].

use canonset_bits::BitWriter;
use canonset_common::{Result, error::Error};
use canonset_format::{CduType, SegmentKind, TokenTag};

use crate::{
    decoded::{DecodedSet, SegmentRef},
    tokens::{Token, coalesce},
};

/// Encodes `set` into a new buffer.
pub fn encode(set: &DecodedSet) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    write_set(set, &mut writer)?;
    writer.align_to_byte();
    let bytes = writer.into_bytes();
    log::debug!(
        "encoded {} ids in {} partitions into {} bytes",
        set.cardinality(),
        set.partition_count(),
        bytes.len()
    );
    Ok(bytes)
}

impl DecodedSet {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Encodes into `buf` and returns the number of bytes written.
    ///
    /// Fails with `DestBufferTooSmall`, leaving `buf` untouched, if the encoding
    /// does not fit.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let bytes = encode(self)?;
        if bytes.len() > buf.len() {
            return Err(Error::dest_buffer_too_small(bytes.len(), buf.len()));
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Size of the encoding in bytes, computed without materializing it.
    pub fn encoded_len(&self) -> Result<usize> {
        let mut counter = BitCounter(0);
        write_set(self, &mut counter)?;
        Ok(counter.0.div_ceil(8))
    }
}

/// Destination of the encoding walk.
trait FieldSink {
    fn field(&mut self, ty: &CduType, value: u64) -> Result<()>;

    fn bits(&mut self, value: u64, width: u32);
}

impl FieldSink for BitWriter {
    fn field(&mut self, ty: &CduType, value: u64) -> Result<()> {
        ty.write(self, value)
    }

    fn bits(&mut self, value: u64, width: u32) {
        self.write(value, width);
    }
}

struct BitCounter(usize);

impl FieldSink for BitCounter {
    fn field(&mut self, ty: &CduType, value: u64) -> Result<()> {
        self.0 += ty.encoded_bits(value)?;
        Ok(())
    }

    fn bits(&mut self, _value: u64, width: u32) {
        self.0 += width as usize;
    }
}

fn write_set(set: &DecodedSet, sink: &mut impl FieldSink) -> Result<()> {
    let format = set.format();
    let fields = &format.fields;
    sink.field(&fields.format_version, format.version)?;
    sink.field(&fields.partition_count, set.partition_count() as u64)?;

    let mut prev_id: Option<u32> = None;
    for partition in set.partitions() {
        let id = partition.id();
        let delta = match prev_id {
            None => id as u64,
            Some(prev) => (id - prev - 1) as u64,
        };
        sink.field(&fields.partition_delta, delta)?;
        sink.field(&fields.segment_count, partition.segment_count() as u64)?;

        let mut prev_end: Option<u64> = None;
        for segment in partition.segments() {
            sink.bits(segment.kind().to_bit() as u64, 1);
            let start_delta = match prev_end {
                None => segment.start(),
                Some(end) => segment.start() - end,
            };
            sink.field(&fields.start_delta, start_delta)?;
            sink.field(&fields.length, segment.len() - 1)?;
            match segment.kind() {
                SegmentKind::Uniform => sink.bits(format.rare_bit() as u64, 1),
                SegmentKind::Mixed => write_tokens(set, &segment, sink)?,
            }
            prev_end = Some(segment.end());
        }
        prev_id = Some(id);
    }
    Ok(())
}

fn write_tokens(set: &DecodedSet, segment: &SegmentRef, sink: &mut impl FieldSink) -> Result<()> {
    let fields = &set.format().fields;
    let chunks = segment.chunks();
    let mut index = 0usize;
    for token in coalesce(chunks) {
        let repeat = token.repeat();
        match token {
            Token::Enumerated { popcount, rank, .. } => {
                sink.field(&CduType::TOKEN_TAG, TokenTag::Enumerated.bits())?;
                let run_flag = if repeat > 1 { TokenTag::ENUM_RUN_FLAG } else { 0 };
                sink.field(&CduType::POPCOUNT, popcount as u64 | run_flag)?;
                if repeat > 1 {
                    sink.field(&fields.repeat_count, repeat)?;
                }
                let width = chunks[index].width();
                sink.bits(rank, canonset_combinadic::rank_bits(width, popcount));
            }
            Token::Raw { .. } => {
                if repeat == 1 {
                    sink.field(&CduType::TOKEN_TAG, TokenTag::Raw.bits())?;
                } else {
                    sink.field(&CduType::TOKEN_TAG, TokenTag::RawRun.bits())?;
                    sink.field(&fields.repeat_count, repeat)?;
                }
                for chunk in &chunks[index..index + repeat as usize] {
                    sink.bits(chunk.bits(), chunk.width());
                }
            }
        }
        index += repeat as usize;
    }
    log::trace!(
        "segment at {} ({} bits): {} chunks",
        segment.start(),
        segment.len(),
        chunks.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_is_one_zero_byte() {
        let set = DecodedSet::new();
        assert_eq!(encode(&set).unwrap(), vec![0x00]);
        assert_eq!(set.encoded_len().unwrap(), 1);
    }

    #[test]
    fn test_encoded_len_matches() {
        let set = DecodedSet::from_ids((0..500).map(|i| i * i)).unwrap();
        let bytes = set.encode().unwrap();
        assert_eq!(set.encoded_len().unwrap(), bytes.len());

        let mut buf = vec![0xaau8; bytes.len() + 3];
        assert_eq!(set.encode_into(&mut buf).unwrap(), bytes.len());
        assert_eq!(&buf[..bytes.len()], &bytes[..]);
        assert_eq!(buf[bytes.len()], 0xaa);

        let mut short = vec![0u8; bytes.len() - 1];
        let err = set.encode_into(&mut short).unwrap_err();
        assert!(matches!(
            err.kind(),
            canonset_common::error::ErrorKind::DestBufferTooSmall { .. }
        ));
        assert!(short.iter().all(|&b| b == 0));
    }
}
