//! # Canonset: canonical encoding of sparse identifier sets
//!
//! Canonset maps every subset of the 64-bit identifier domain to exactly one byte
//! sequence, and every accepted byte sequence back to exactly one subset. Equal
//! sets therefore always have equal encodings, and any byte sequence that is not
//! the encoding of some set is rejected on decode.
//!
//! Encoding stays proportional to the structure of the set, not to the size of
//! the domain: long gaps cost a few bits, long runs of members cost a few bits,
//! and irregular regions are stored as combinadic ranks or raw bits per 64-bit
//! chunk.
//!
//! ```
//! let set = canonset::DecodedSet::from_ids([5, 10, 15, 1 << 40]).unwrap();
//! let bytes = canonset::encode(&set).unwrap();
//! let decoded = canonset::decode(&bytes).unwrap();
//! assert_eq!(decoded, set);
//! assert!(decoded.contains(1 << 40));
//! assert_eq!(decoded.rank(11), 2);
//! ```
//!
//! ## Module Organization
//!
//! * [`codec`] - Hierarchical encoder, decoder, canon validator and set algebra
//! * [`format`] - CDU integer codec and frozen per-version format parameters
//! * [`common`] - Error type and result alias
//!
//! ### Support Modules
//!
//! * [`support::bits`] - Bit-level buffer primitives
//! * [`support::combinadic`] - Combinadic rank and unrank of fixed-popcount patterns

pub use canonset_codec as codec;
pub use canonset_common as common;
pub use canonset_format as format;

pub use canonset_codec::{
    CapacityLimits, DecodedSet, IdSet, WordSet, decode, decode_with_limits, encode, validate,
    validate_encoding,
};
pub use canonset_common::{Result, error::Error, error::ErrorKind};

pub mod support {
    pub use canonset_bits as bits;
    pub use canonset_combinadic as combinadic;
}
