//! Versioned format parameters.
//!
//! A [`FormatSpec`] fixes every threshold and field type that influences the
//! encoded bytes. Shipped versions are frozen: changing any value here changes
//! the bijection, so evolution happens by adding a new version.

use canonset_common::{Result, error::Error};

use crate::cdu::CduType;

/// Version marker of the single-word reference encoding (identifiers `0..64`).
pub const TRIVIAL_FORMAT_VERSION: u64 = 1023;

/// Bit order of fixed and raw fields within the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Bit 0 of a field is stored first and maps to the lowest identifier.
    LsbFirst,
}

/// CDU type assigned to each numeric field of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTypes {
    pub format_version: CduType,
    pub partition_count: CduType,
    pub partition_delta: CduType,
    pub segment_count: CduType,
    pub start_delta: CduType,
    pub length: CduType,
    pub repeat_count: CduType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub version: u64,
    /// Identifiers per partition are `2^partition_bits`.
    pub partition_bits: u32,
    pub chunk_bits: u32,
    /// Highest chunk popcount stored as an enumerated rank.
    pub enum_popcount_max: u32,
    /// Width of the popcount field of an enumerated token.
    pub popcount_field_bits: u32,
    /// Dominant gaps at least this long always separate segments.
    pub dominant_run_threshold: u64,
    /// Shortest all-rare segment stored as a uniform run.
    pub rare_run_threshold: u64,
    /// Segments longer than this are split at an inner dominant gap when one exists.
    pub max_segment_len_hint: u64,
    /// Majority bit value; only the opposite (rare) value is recorded.
    pub dominant_bit: bool,
    pub bit_order: BitOrder,
    pub fields: FieldTypes,
}

/// Format 0.
pub static FORMAT_0: FormatSpec = FormatSpec {
    version: 0,
    partition_bits: 32,
    chunk_bits: 64,
    enum_popcount_max: 18,
    popcount_field_bits: 6,
    dominant_run_threshold: 96,
    rare_run_threshold: 64,
    max_segment_len_hint: 2048,
    dominant_bit: false,
    bit_order: BitOrder::LsbFirst,
    fields: FieldTypes {
        format_version: CduType::DEFAULT,
        partition_count: CduType::SMALL_INT,
        partition_delta: CduType::LARGE_INT,
        segment_count: CduType::SMALL_INT,
        start_delta: CduType::INITIAL_DELTA,
        length: CduType::MEDIUM_INT,
        repeat_count: CduType::SMALL_INT,
    },
};

static FORMATS: [&FormatSpec; 1] = [&FORMAT_0];

impl FormatSpec {
    /// Returns the frozen parameters for `version`.
    pub fn lookup(version: u64) -> Result<&'static FormatSpec> {
        FORMATS
            .iter()
            .copied()
            .find(|spec| spec.version == version)
            .ok_or_else(|| Error::unsupported_format(version))
    }

    /// The format new encodings are produced in.
    pub fn current() -> &'static FormatSpec {
        &FORMAT_0
    }

    /// Number of identifiers covered by one partition.
    #[inline]
    pub fn partition_len(&self) -> u64 {
        1u64 << self.partition_bits
    }

    #[inline]
    pub fn partition_of(&self, id: u64) -> u64 {
        id >> self.partition_bits
    }

    #[inline]
    pub fn offset_of(&self, id: u64) -> u64 {
        id & (self.partition_len() - 1)
    }

    /// The bit value recorded by segments (the complement of the dominant bit).
    #[inline]
    pub fn rare_bit(&self) -> bool {
        !self.dominant_bit
    }

    /// Number of chunks a mixed segment of `segment_len` bits is cut into.
    #[inline]
    pub fn chunk_count(&self, segment_len: u64) -> u64 {
        segment_len.div_ceil(self.chunk_bits as u64)
    }

    /// Width of chunk `index` of a mixed segment; only the final chunk may be
    /// narrower than `chunk_bits`.
    #[inline]
    pub fn chunk_width(&self, segment_len: u64, index: u64) -> u32 {
        let chunk_bits = self.chunk_bits as u64;
        (segment_len - index * chunk_bits).min(chunk_bits) as u32
    }

    /// Whether a chunk of this popcount is stored as an enumerated rank.
    #[inline]
    pub fn is_enumerable(&self, popcount: u32) -> bool {
        popcount <= self.enum_popcount_max
    }
}
