//! Colexicographic rank and unrank of fixed-popcount bit patterns.
//!
//! For a pattern with set positions `p_0 < p_1 < ... < p_{k-1}`, the rank is
//! `C(p_0, 1) + C(p_1, 2) + ... + C(p_{k-1}, k)`. Patterns with the same `n` and `k`
//! receive distinct ranks covering exactly `[0, C(n, k))`, ordered by their highest
//! differing bit.

use canonset_common::{Result, verify_arg};

use crate::table::{BinomialTable, K_MAX, N_MAX};

/// Returns the colexicographic rank of `bits` among all `n`-bit patterns with
/// exactly `k` bits set.
///
/// Runs in O(k): only set bits are visited.
///
/// # Errors
///
/// `InvalidArgument` if `n > 64`, `k > 18`, `k > n`, `bits` has a bit set at or
/// above position `n`, or the popcount of `bits` is not `k`.
pub fn rank(bits: u64, n: u32, k: u32) -> Result<u64> {
    check_range(n, k)?;
    verify_arg!(bits, n == N_MAX || bits >> n == 0);
    verify_arg!(k, bits.count_ones() == k);

    let table = BinomialTable::get();
    let mut rest = bits;
    let mut rank = 0u64;
    let mut j = 1;
    while rest != 0 {
        let pos = rest.trailing_zeros();
        rank += table.binomial(pos, j);
        rest &= rest - 1;
        j += 1;
    }
    Ok(rank)
}

/// Returns the `n`-bit pattern with `k` bits set whose colexicographic rank is
/// `rank`. Exact inverse of [`rank`].
///
/// # Errors
///
/// `InvalidArgument` on the same range violations as [`rank`], or if
/// `rank >= C(n, k)`.
pub fn unrank(rank: u64, n: u32, k: u32) -> Result<u64> {
    check_range(n, k)?;
    let table = BinomialTable::get();
    verify_arg!(rank, rank < table.binomial(n, k));

    let mut bits = 0u64;
    let mut remaining = rank;
    let mut r = k;
    let mut pos = n;
    while r > 0 {
        pos -= 1;
        let c = table.row(r)[pos as usize];
        if c <= remaining {
            bits |= 1 << pos;
            remaining -= c;
            r -= 1;
        }
    }
    Ok(bits)
}

/// Returns `true` if `rank` is a possible rank for `(n, k)`, i.e. `rank < C(n, k)`.
///
/// Arguments outside the table are never valid.
pub fn rank_valid(rank: u64, n: u32, k: u32) -> bool {
    n <= N_MAX && k <= K_MAX && rank < BinomialTable::get().binomial(n, k)
}

fn check_range(n: u32, k: u32) -> Result<()> {
    verify_arg!(n, n <= N_MAX);
    verify_arg!(k, k <= K_MAX);
    verify_arg!(k, k <= n);
    Ok(())
}
