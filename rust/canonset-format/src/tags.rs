//! Structural tags of the encoded stream.

use canonset_common::{Result, error::Error};

/// Kind of a segment: a uniform run of rare bits, or a mixed region cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Uniform,
    Mixed,
}

impl SegmentKind {
    /// Wire value of the 1-bit segment kind field.
    pub fn to_bit(self) -> bool {
        matches!(self, SegmentKind::Mixed)
    }

    pub fn from_bit(bit: bool) -> SegmentKind {
        if bit {
            SegmentKind::Mixed
        } else {
            SegmentKind::Uniform
        }
    }
}

/// 2-bit token tag preceding every token of a mixed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenTag {
    Enumerated = 0b00,
    Raw = 0b01,
    RawRun = 0b10,
}

impl TokenTag {
    /// Bit of the popcount field marking an enumerated token that covers a run of
    /// identical chunks; a repeat count follows the field when set.
    pub const ENUM_RUN_FLAG: u64 = 1 << 5;

    pub fn bits(self) -> u64 {
        self as u64
    }

    /// Parses a tag value. The reserved value `0b11` is rejected as malformed.
    pub fn from_bits(bits: u64) -> Result<TokenTag> {
        match bits {
            0b00 => Ok(TokenTag::Enumerated),
            0b01 => Ok(TokenTag::Raw),
            0b10 => Ok(TokenTag::RawRun),
            other => Err(Error::malformed(
                "token_tag",
                format!("reserved token tag {other:#04b}"),
            )),
        }
    }
}
