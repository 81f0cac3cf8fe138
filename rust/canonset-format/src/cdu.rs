//! CDU: parameterized integer fields.
//!
//! A [`CduType`] is either fixed-width (always exactly N bits) or variable-width. A
//! variable type is an ordered list of step widths. The value is emitted in
//! little-endian pieces, one piece per step, each followed by a continuation bit
//! (1 = another step follows). The encoder stops at the first step whose width can
//! hold what is left of the value, so every value has exactly one valid encoding:
//!
//! ```
//! use canonset_format::cdu::{CduType, cdu_decode, cdu_encode};
//!
//! let mut buf = [0u8; 8];
//! // SMALL_INT steps are 4, 6, 6, 16 bits: 100 needs two steps (4 + 1 + 6 + 1 bits).
//! let written = cdu_encode(100, &CduType::SMALL_INT, &mut buf, 3).unwrap();
//! assert_eq!(written, 12);
//! assert_eq!(cdu_decode(&buf, 3, 64, &CduType::SMALL_INT).unwrap(), (100, 12));
//! ```
//!
//! Decoding rejects encodings that use more steps than necessary as a canonicity
//! violation. A continuation bit set on the last step of the type is malformed.

use canonset_bits::{BitReader, BitWriter, low_mask, write_bits};
use canonset_common::{Result, error::Error};

/// Upper bound on the number of steps of a variable type.
pub const MAX_STEPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CduKind {
    Fixed {
        bits: u8,
    },
    Variable {
        steps: [u8; MAX_STEPS],
        step_count: u8,
        base_bits: u8,
    },
}

/// Immutable description of how one category of integer fields is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CduType {
    name: &'static str,
    kind: CduKind,
}

impl CduType {
    /// Format version marker.
    pub const DEFAULT: CduType = CduType::variable("default", 16, 0, 3, 5);
    /// Counts: partitions, segments, run repeats.
    pub const SMALL_INT: CduType = CduType::variable("small_int", 32, 4, 6, 2);
    /// Segment lengths.
    pub const MEDIUM_INT: CduType = CduType::variable("medium_int", 32, 6, 7, 2);
    /// Partition identifier deltas.
    pub const LARGE_INT: CduType = CduType::variable("large_int", 32, 5, 7, 2);
    /// Segment start offsets and inter-segment gaps.
    pub const INITIAL_DELTA: CduType = CduType::variable("initial_delta", 32, 3, 8, 2);

    pub const FLAG: CduType = CduType::fixed("flag", 1);
    pub const TOKEN_TAG: CduType = CduType::fixed("token_tag", 2);
    pub const POPCOUNT: CduType = CduType::fixed("popcount", 6);
    pub const RAW64: CduType = CduType::fixed("raw64", 64);

    /// A fixed-width type of `bits` bits (`0..=64`).
    pub const fn fixed(name: &'static str, bits: u32) -> CduType {
        assert!(bits <= 64, "fixed CDU width exceeds 64 bits");
        CduType {
            name,
            kind: CduKind::Fixed { bits: bits as u8 },
        }
    }

    /// A variable-width type able to hold any value below `2^base_bits`.
    ///
    /// The step list is `first`, then up to `max_middle_steps` steps of `step` bits,
    /// then a final step holding the remaining bits. Middle steps are dropped until
    /// the final step is at least `step` bits wide. Otherwise a value could be
    /// minimal in two different step counts. Parameter sets that cannot satisfy this
    /// are rejected when the constant is evaluated.
    pub const fn variable(
        name: &'static str,
        base_bits: u32,
        first: u32,
        step: u32,
        max_middle_steps: u32,
    ) -> CduType {
        assert!(base_bits <= 64, "CDU base width exceeds 64 bits");
        assert!(first < base_bits, "first CDU step must be narrower than the base");
        assert!(step > 0, "CDU step width must be positive");

        let remaining = base_bits - first;
        let mut middle = remaining / step;
        if middle > max_middle_steps {
            middle = max_middle_steps;
        }
        while middle > 0 && remaining - middle * step < step {
            middle -= 1;
        }
        let last = remaining - middle * step;
        assert!(
            last >= step,
            "final CDU step must be at least as wide as the repeating step"
        );
        assert!(middle as usize + 2 <= MAX_STEPS, "too many CDU steps");

        let mut steps = [0u8; MAX_STEPS];
        steps[0] = first as u8;
        let mut i = 1;
        while i <= middle as usize {
            steps[i] = step as u8;
            i += 1;
        }
        steps[i] = last as u8;

        CduType {
            name,
            kind: CduKind::Variable {
                steps,
                step_count: (middle + 2) as u8,
                base_bits: base_bits as u8,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.kind, CduKind::Fixed { .. })
    }

    /// Step widths of a variable type, or the single width of a fixed one.
    pub fn steps(&self) -> &[u8] {
        match &self.kind {
            CduKind::Fixed { bits } => std::slice::from_ref(bits),
            CduKind::Variable {
                steps, step_count, ..
            } => &steps[..*step_count as usize],
        }
    }

    /// Largest encodable value.
    pub fn max_value(&self) -> u64 {
        match self.kind {
            CduKind::Fixed { bits } => low_mask(bits as u32),
            CduKind::Variable { base_bits, .. } => low_mask(base_bits as u32),
        }
    }

    /// Number of bits `value` occupies when encoded.
    pub fn encoded_bits(&self, value: u64) -> Result<usize> {
        self.check_value(value)?;
        let mut bits = 0usize;
        self.emit(value, |_, width| bits += width as usize);
        Ok(bits)
    }

    /// Appends the canonical encoding of `value`.
    pub fn write(&self, writer: &mut BitWriter, value: u64) -> Result<()> {
        self.check_value(value)?;
        self.emit(value, |field, width| writer.write(field, width));
        Ok(())
    }

    /// Reads one value, enforcing the minimal step count.
    pub fn read(&self, reader: &mut BitReader) -> Result<u64> {
        let (steps, step_count) = match self.kind {
            CduKind::Fixed { bits } => {
                return reader
                    .read(bits as u32)
                    .ok_or_else(|| Error::truncated(self.name));
            }
            CduKind::Variable {
                steps, step_count, ..
            } => (steps, step_count as usize),
        };

        let mut value = 0u64;
        let mut shift = 0u32;
        for (i, &width) in steps[..step_count].iter().enumerate() {
            let width = width as u32;
            let data = reader
                .read(width)
                .ok_or_else(|| Error::truncated(self.name))?;
            let more = reader
                .read_bit()
                .ok_or_else(|| Error::truncated(self.name))?;
            value |= data << shift;
            if !more {
                if i > 0 && data == 0 {
                    return Err(Error::canon_violation(
                        self.name,
                        format!("value {value} encoded with {} steps, fewer suffice", i + 1),
                    ));
                }
                return Ok(value);
            }
            shift += width;
        }
        Err(Error::malformed(
            self.name,
            "continuation bit set on the final step",
        ))
    }

    fn check_value(&self, value: u64) -> Result<()> {
        if value > self.max_value() {
            return Err(Error::invalid_arg(
                self.name,
                format!("value {value} exceeds {}", self.max_value()),
            ));
        }
        Ok(())
    }

    /// Feeds the encoded fields of `value` (data pieces and continuation bits) to
    /// `sink` as `(field, width)` pairs. `value` must be in range.
    fn emit(&self, value: u64, mut sink: impl FnMut(u64, u32)) {
        let steps = match &self.kind {
            CduKind::Fixed { bits } => {
                sink(value, *bits as u32);
                return;
            }
            CduKind::Variable {
                steps, step_count, ..
            } => &steps[..*step_count as usize],
        };

        let mut rest = value;
        for (i, &width) in steps.iter().enumerate() {
            let width = width as u32;
            let is_last = i + 1 == steps.len();
            if is_last || rest <= low_mask(width) {
                sink(rest, width);
                sink(0, 1);
                return;
            }
            sink(rest & low_mask(width), width);
            sink(1, 1);
            rest = rest.checked_shr(width).unwrap_or(0);
        }
    }
}

/// Writes `value` at `bit_pos` and returns the number of bits written.
///
/// # Errors
///
/// `InvalidArgument` if `value` is out of range for `ty`, `DestBufferTooSmall` if the
/// field does not fit in `buf`. Nothing is written on error.
pub fn cdu_encode(value: u64, ty: &CduType, buf: &mut [u8], bit_pos: usize) -> Result<usize> {
    let bits = ty.encoded_bits(value)?;
    let available = (buf.len() * 8).saturating_sub(bit_pos);
    if bits > available {
        return Err(Error::dest_buffer_too_small(
            (bit_pos + bits).div_ceil(8),
            buf.len(),
        ));
    }
    let mut pos = bit_pos;
    ty.emit(value, |field, width| {
        write_bits(buf, pos, field, width);
        pos += width as usize;
    });
    Ok(bits)
}

/// Number of bits `value` occupies when encoded as `ty`.
pub fn cdu_encoded_bits(value: u64, ty: &CduType) -> Result<usize> {
    ty.encoded_bits(value)
}

/// Reads a value at `bit_pos`, never reading at or beyond `bit_limit`. Returns the
/// value and the number of bits consumed.
///
/// # Errors
///
/// `Malformed` if the limit is reached mid-field or the continuation run does not
/// terminate within the type's steps; `CanonViolation` if the value was not encoded
/// with the minimal number of steps.
pub fn cdu_decode(
    buf: &[u8],
    bit_pos: usize,
    bit_limit: usize,
    ty: &CduType,
) -> Result<(u64, usize)> {
    if bit_pos > bit_limit.min(buf.len() * 8) {
        return Err(Error::truncated(ty.name()));
    }
    let mut reader = BitReader::with_limit(buf, bit_pos, bit_limit);
    let value = ty.read(&mut reader)?;
    Ok((value, reader.position() - bit_pos))
}
