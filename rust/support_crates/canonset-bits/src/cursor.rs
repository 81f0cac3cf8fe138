//! Sequential bit cursors over byte buffers.

use crate::buffer::{read_bits, write_bits};

/// Growable LSB-first bit sink.
///
/// The backing bytes are zero-initialized as they grow, so any padding bits past
/// [`BitWriter::bit_len`] in the final byte are always zero.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Appends the low `width` bits of `value`.
    #[inline]
    pub fn write(&mut self, value: u64, width: u32) {
        let end = self.bit_len + width as usize;
        let needed = end.div_ceil(8);
        if self.bytes.len() < needed {
            self.bytes.resize(needed, 0);
        }
        write_bits(&mut self.bytes, self.bit_len, value, width);
        self.bit_len = end;
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write(bit as u64, 1);
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Advances to the next byte boundary. Skipped bits stay zero.
    pub fn align_to_byte(&mut self) {
        self.bit_len = self.bit_len.next_multiple_of(8);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Bounded LSB-first bit source.
///
/// Every read checks the remaining bit budget first and returns `None` instead of
/// running past the limit, so untrusted input can be parsed without panics.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader over the whole buffer.
    pub fn new(buf: &'a [u8]) -> BitReader<'a> {
        BitReader {
            buf,
            pos: 0,
            limit: buf.len() * 8,
        }
    }

    /// Creates a reader positioned at `bit_pos` that never reads at or past
    /// `bit_limit`. The limit is clamped to the buffer size.
    pub fn with_limit(buf: &'a [u8], bit_pos: usize, bit_limit: usize) -> BitReader<'a> {
        let limit = bit_limit.min(buf.len() * 8);
        BitReader {
            buf,
            pos: bit_pos.min(limit),
            limit,
        }
    }

    /// Reads a `width`-bit field (`width <= 64`), or returns `None` if fewer than
    /// `width` bits remain.
    #[inline]
    pub fn read(&mut self, width: u32) -> Option<u64> {
        if width > 64 || self.remaining() < width as usize {
            return None;
        }
        let value = read_bits(self.buf, self.pos, width);
        self.pos += width as usize;
        Some(value)
    }

    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        self.read(1).map(|b| b == 1)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_reader_sequence() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write(0b10110, 5);
        writer.write(u64::MAX, 64);
        writer.write(0, 0);
        writer.write(0x3, 2);
        assert_eq!(writer.bit_len(), 72);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 9);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bit(), Some(true));
        assert_eq!(reader.read(5), Some(0b10110));
        assert_eq!(reader.read(64), Some(u64::MAX));
        assert_eq!(reader.read(0), Some(0));
        assert_eq!(reader.read(2), Some(0x3));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read(1), None);
    }

    #[test]
    fn test_align_pads_with_zeros() {
        let mut writer = BitWriter::new();
        writer.write(0b111, 3);
        writer.align_to_byte();
        assert_eq!(writer.bit_len(), 8);
        writer.align_to_byte();
        assert_eq!(writer.bit_len(), 8);
        writer.write(1, 1);
        assert_eq!(writer.as_bytes(), &[0b0000_0111, 0b0000_0001]);
    }

    #[test]
    fn test_reader_limit() {
        let bytes = [0xffu8; 4];
        let mut reader = BitReader::with_limit(&bytes, 4, 12);
        assert_eq!(reader.remaining(), 8);
        assert_eq!(reader.read(9), None);
        // A failed read does not advance.
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read(8), Some(0xff));
        assert_eq!(reader.read_bit(), None);

        let clamped = BitReader::with_limit(&bytes, 0, 1_000);
        assert_eq!(clamped.limit(), 32);
    }
}
