//! Wire-level definitions of the canonical set encoding: the CDU integer codec,
//! the frozen per-version format parameters, and the structural tags.

pub mod cdu;
pub mod format_spec;
pub mod tags;

pub use cdu::{CduType, cdu_decode, cdu_encode, cdu_encoded_bits};
pub use format_spec::{FORMAT_0, FieldTypes, FormatSpec, TRIVIAL_FORMAT_VERSION};
pub use tags::{SegmentKind, TokenTag};
