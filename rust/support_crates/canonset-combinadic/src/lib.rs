//! Combinatorial number system (combinadic) over 64-bit chunks.
//!
//! A chunk of `n <= 64` bits with exactly `k <= 18` bits set is mapped to its
//! colexicographic rank in `[0, C(n, k))`, and back. The rank needs only
//! [`rank_bits`]`(n, k)` bits, which is what makes sparse chunks cheap to store.
//!
//! The binomial coefficients come from a process-wide [`BinomialTable`] that is
//! built on first use and immutable afterwards.

pub mod ranking;
pub mod table;

#[cfg(test)]
mod tests;

pub use ranking::{rank, rank_valid, unrank};
pub use table::{BinomialTable, K_MAX, N_MAX, binomial, rank_bits};
