//! Hierarchical encoder and decoder of canonical identifier sets.
//!
//! A set of 64-bit identifiers is split into partitions of `2^32` identifiers,
//! each partition into segments separated by long gaps, and each mixed segment
//! into 64-bit chunks stored as combinadic ranks or raw bits. Every set has
//! exactly one encoding and every accepted byte sequence exactly one set:
//!
//! ```
//! use canonset_codec::{DecodedSet, decode, encode};
//!
//! let set = DecodedSet::from_ids([5, 10, 15]).unwrap();
//! let bytes = encode(&set).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), set);
//! ```

pub mod arena;
pub mod canon;
pub mod decoded;
pub mod decoder;
pub mod encoder;
pub mod id_set;
pub mod runs;
pub mod segmenter;
pub mod set_ops;
pub mod tokens;
pub mod trivial;

#[cfg(test)]
mod tests;

pub use canon::{validate, validate_encoding};
pub use decoded::{CapacityLimits, DecodedSet, PartitionRef, SegmentRef};
pub use decoder::{decode, decode_with_limits};
pub use encoder::encode;
pub use id_set::IdSet;
pub use set_ops::{difference, intersection, union};
pub use tokens::{Chunk, ChunkToken, Token};
pub use trivial::WordSet;
