//! Core definitions shared by all canonset-* crates: the error type and the
//! `Result` alias, plus the verification macros used while parsing encoded sets.

pub mod error;
pub mod result;

pub use result::Result;
