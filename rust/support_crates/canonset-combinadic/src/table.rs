use std::sync::LazyLock;

/// Largest chunk width covered by the table.
pub const N_MAX: u32 = 64;

/// Largest popcount covered by the table.
pub const K_MAX: u32 = 18;

const N_COUNT: usize = N_MAX as usize + 1;
const K_COUNT: usize = K_MAX as usize + 1;

static TABLE: LazyLock<BinomialTable> = LazyLock::new(BinomialTable::build);

/// Binomial coefficients `C(n, k)` for `k in 0..=18`, `n in 0..=64`, and the number
/// of bits needed to store a rank below each of them.
///
/// Rows are indexed by `k` so that the rank and unrank loops, which walk positions
/// for a fixed remaining popcount, read consecutive memory.
pub struct BinomialTable {
    coefficients: [[u64; N_COUNT]; K_COUNT],
    rank_bits: [[u8; N_COUNT]; K_COUNT],
}

impl BinomialTable {
    /// Returns the shared table, building it on first access.
    ///
    /// Concurrent first calls block until one of them has finished building, so a
    /// partially filled table is never observable.
    #[inline]
    pub fn get() -> &'static BinomialTable {
        &TABLE
    }

    fn build() -> BinomialTable {
        let mut coefficients = [[0u64; N_COUNT]; K_COUNT];
        let mut rank_bits = [[0u8; N_COUNT]; K_COUNT];

        // Pascal's rule: C(n, k) = C(n - 1, k - 1) + C(n - 1, k). Every entry in
        // range stays below C(64, 18) < 2^52, so no intermediate overflows.
        for n in 0..N_COUNT {
            coefficients[0][n] = 1;
            for k in 1..K_COUNT.min(n + 1) {
                coefficients[k][n] = coefficients[k - 1][n - 1] + coefficients[k][n - 1];
            }
        }
        for k in 0..K_COUNT {
            for n in 0..N_COUNT {
                rank_bits[k][n] = ceil_log2(coefficients[k][n]) as u8;
            }
        }

        log::debug!(
            "combinadic table built: C(n, k) for n <= {N_MAX}, k <= {K_MAX}, widest rank {} bits",
            rank_bits[K_MAX as usize][N_MAX as usize]
        );
        BinomialTable {
            coefficients,
            rank_bits,
        }
    }

    /// `C(n, k)`, or 0 when `k > n`.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64` or `k > 18`.
    #[inline]
    pub fn binomial(&self, n: u32, k: u32) -> u64 {
        self.coefficients[k as usize][n as usize]
    }

    /// `ceil(log2(C(n, k)))`, or 0 when at most one arrangement exists.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64` or `k > 18`.
    #[inline]
    pub fn rank_bits(&self, n: u32, k: u32) -> u32 {
        self.rank_bits[k as usize][n as usize] as u32
    }

    /// Row of `C(p, k)` values for all positions `p in 0..=64`.
    #[inline]
    pub(crate) fn row(&self, k: u32) -> &[u64; N_COUNT] {
        &self.coefficients[k as usize]
    }
}

/// `C(n, k)` from the shared table; 0 for `k > n` or out-of-table arguments.
pub fn binomial(n: u32, k: u32) -> u64 {
    if n > N_MAX || k > K_MAX {
        return 0;
    }
    BinomialTable::get().binomial(n, k)
}

/// Number of bits used to store a rank for `(n, k)`; 0 for out-of-table arguments.
pub fn rank_bits(n: u32, k: u32) -> u32 {
    if n > N_MAX || k > K_MAX {
        return 0;
    }
    BinomialTable::get().rank_bits(n, k)
}

fn ceil_log2(value: u64) -> u32 {
    if value <= 1 {
        0
    } else {
        u64::BITS - (value - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(1 << 40), 40);
        assert_eq!(ceil_log2((1 << 40) + 1), 41);
    }

    #[test]
    fn test_known_coefficients() {
        let table = BinomialTable::get();
        assert_eq!(table.binomial(0, 0), 1);
        assert_eq!(table.binomial(4, 2), 6);
        assert_eq!(table.binomial(11, 3), 165);
        assert_eq!(table.binomial(64, 1), 64);
        assert_eq!(table.binomial(64, 18), 3_601_688_791_018_080);
        assert_eq!(table.binomial(3, 5), 0);
    }

    #[test]
    fn test_rank_bits_edges() {
        let table = BinomialTable::get();
        for n in 0..=N_MAX {
            assert_eq!(table.rank_bits(n, 0), 0);
            if n <= K_MAX {
                assert_eq!(table.rank_bits(n, n), 0);
            }
        }
        assert_eq!(table.rank_bits(4, 2), 3);
        assert_eq!(table.rank_bits(64, 1), 6);
        assert_eq!(table.rank_bits(11, 3), 8);
        assert_eq!(table.rank_bits(64, 18), 52);
        assert_eq!(rank_bits(65, 1), 0);
        assert_eq!(binomial(64, 19), 0);
    }

    #[test]
    fn test_concurrent_first_access() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| BinomialTable::get().binomial(64, 18)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3_601_688_791_018_080);
        }
    }
}
