//! Bit-level buffer primitives.
//!
//! All functions in this crate number bits least-significant-bit first across the
//! byte stream: bit 0 of the stream is bit 0 of byte 0, bit 8 is bit 0 of byte 1,
//! and so on. A field of `width` bits written at `bit_offset` stores its lowest
//! bit at `bit_offset`.
//!
//! - [`buffer`]: stateless `read_bits` / `write_bits` over byte slices.
//! - [`cursor`]: [`BitWriter`] and [`BitReader`] for sequential field access.
//! - [`words`]: helpers over `u64` words holding bit patterns (range fill, run scan).

pub mod buffer;
pub mod cursor;
pub mod words;

pub use buffer::{low_mask, read_bits, write_bits};
pub use cursor::{BitReader, BitWriter};
pub use words::{BitRuns, set_bit_range};
