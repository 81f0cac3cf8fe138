//! Arbitrary-width field access at arbitrary bit offsets.
//!
//! A field of up to 64 bits starting at any bit offset spans at most 9 bytes.
//! Both primitives gather those bytes into a 128-bit little-endian scratch word,
//! operate on it with plain shifts and masks, and (for writes) scatter the same
//! bytes back. No byte outside the field's window is touched.

/// Returns a mask with the low `width` bits set. `width` must be in `0..=64`.
#[inline]
pub const fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reads a `width`-bit field starting at `bit_offset`.
///
/// A `width` of 0 returns 0 without touching the buffer.
///
/// # Panics
///
/// Panics if `width > 64` or if the field extends past the end of `buf`.
#[inline]
pub fn read_bits(buf: &[u8], bit_offset: usize, width: u32) -> u64 {
    assert!(width <= 64, "field width {width} exceeds 64 bits");
    if width == 0 {
        return 0;
    }
    let (first, last, shift) = window(bit_offset, width);
    let scratch = load_window(&buf[first..=last]);
    ((scratch >> shift) as u64) & low_mask(width)
}

/// Writes the low `width` bits of `value` at `bit_offset`.
///
/// Bits outside `[bit_offset, bit_offset + width)` keep their previous values, and
/// bits of `value` at or above `width` are ignored. A `width` of 0 is a no-op.
///
/// # Panics
///
/// Panics if `width > 64` or if the field extends past the end of `buf`.
#[inline]
pub fn write_bits(buf: &mut [u8], bit_offset: usize, value: u64, width: u32) {
    assert!(width <= 64, "field width {width} exceeds 64 bits");
    if width == 0 {
        return;
    }
    let (first, last, shift) = window(bit_offset, width);
    let bytes = &mut buf[first..=last];
    let mask = (low_mask(width) as u128) << shift;
    let mut scratch = load_window(bytes);
    scratch = (scratch & !mask) | (((value & low_mask(width)) as u128) << shift);
    let scattered = scratch.to_le_bytes();
    bytes.copy_from_slice(&scattered[..bytes.len()]);
}

/// Returns the inclusive byte window `[first, last]` covering the field, and the
/// bit shift of the field within the first byte.
#[inline]
fn window(bit_offset: usize, width: u32) -> (usize, usize, u32) {
    let first = bit_offset / 8;
    let last = (bit_offset + width as usize - 1) / 8;
    (first, last, (bit_offset % 8) as u32)
}

#[inline]
fn load_window(bytes: &[u8]) -> u128 {
    debug_assert!(bytes.len() <= 16);
    let mut scratch = [0u8; 16];
    scratch[..bytes.len()].copy_from_slice(bytes);
    u128::from_le_bytes(scratch)
}
