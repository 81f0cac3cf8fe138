//! Helpers for bit patterns held in `u64` words.
//!
//! Word `i` holds bits `[64 * i, 64 * i + 64)`, bit 0 of a word being its least
//! significant bit.

use std::ops::Range;

/// Sets all bits in `range` to 1.
///
/// # Panics
///
/// Panics if `range.end` exceeds `words.len() * 64`. Empty ranges are a no-op.
pub fn set_bit_range(words: &mut [u64], range: Range<usize>) {
    let Range { start, end } = range;
    if start >= end {
        return;
    }
    assert!(
        end <= words.len() * 64,
        "range end {end} out of bounds (len: {})",
        words.len() * 64
    );

    let (start_word, start_bit) = (start / 64, start % 64);
    let (end_word, end_bit) = (end / 64, end % 64);

    if start_word == end_word {
        // end_bit > start_bit >= 0 here, so the shift is in range.
        words[start_word] |= ((1u64 << end_bit) - 1) & !((1u64 << start_bit) - 1);
        return;
    }

    words[start_word] |= u64::MAX << start_bit;
    for word in &mut words[start_word + 1..end_word] {
        *word = u64::MAX;
    }
    if end_bit > 0 {
        words[end_word] |= (1u64 << end_bit) - 1;
    }
}

/// Iterator over the maximal runs of set bits in the first `len` bits of a word
/// slice, in ascending order.
///
/// Runs crossing word boundaries are reported as one range. The scan jumps between
/// run boundaries with `trailing_zeros` on the word (or its complement), so the
/// cost is proportional to the number of runs and words, never to the number of
/// individual bits.
#[derive(Debug, Clone)]
pub struct BitRuns<'a> {
    words: &'a [u64],
    len: usize,
    pos: usize,
}

impl<'a> BitRuns<'a> {
    /// # Panics
    ///
    /// Panics if `len` exceeds `words.len() * 64`.
    pub fn new(words: &'a [u64], len: usize) -> BitRuns<'a> {
        assert!(len <= words.len() * 64);
        BitRuns { words, len, pos: 0 }
    }

    /// Position of the first bit `>= from` equal to `value`, if any below `len`.
    fn next_position(&self, from: usize, value: bool) -> Option<usize> {
        if from >= self.len {
            return None;
        }
        let load = |idx: usize| {
            if value {
                self.words[idx]
            } else {
                !self.words[idx]
            }
        };
        let mut idx = from / 64;
        let mut word = load(idx) & (u64::MAX << (from % 64));
        loop {
            if word != 0 {
                let pos = idx * 64 + word.trailing_zeros() as usize;
                return (pos < self.len).then_some(pos);
            }
            idx += 1;
            if idx * 64 >= self.len {
                return None;
            }
            word = load(idx);
        }
    }
}

impl Iterator for BitRuns<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let start = self.next_position(self.pos, true)?;
        let end = self.next_position(start, false).unwrap_or(self.len);
        self.pos = end;
        Some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_runs(bits: &[bool]) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut i = 0;
        while i < bits.len() {
            if bits[i] {
                let start = i;
                while i < bits.len() && bits[i] {
                    i += 1;
                }
                runs.push(start..i);
            } else {
                i += 1;
            }
        }
        runs
    }

    #[test]
    fn test_set_bit_range_single_word() {
        let mut words = [0u64; 2];
        set_bit_range(&mut words, 3..7);
        assert_eq!(words, [0b0111_1000, 0]);
        set_bit_range(&mut words, 10..10);
        assert_eq!(words, [0b0111_1000, 0]);
    }

    #[test]
    fn test_set_bit_range_across_words() {
        let mut words = [0u64; 3];
        set_bit_range(&mut words, 60..130);
        assert_eq!(words[0], 0xf000_0000_0000_0000);
        assert_eq!(words[1], u64::MAX);
        assert_eq!(words[2], 0b11);

        let mut words = [0u64; 2];
        set_bit_range(&mut words, 0..128);
        assert_eq!(words, [u64::MAX, u64::MAX]);
    }

    #[test]
    fn test_runs_basic() {
        let words = [0b1011_0001u64, 0];
        let runs: Vec<_> = BitRuns::new(&words, 128).collect();
        assert_eq!(runs, vec![0..1, 4..6, 7..8]);
    }

    #[test]
    fn test_runs_cross_words_and_clip_to_len() {
        let words = [0xffff_0000_0000_0000u64, u64::MAX, 0x0f];
        let runs: Vec<_> = BitRuns::new(&words, 192).collect();
        assert_eq!(runs, vec![48..132]);

        let clipped: Vec<_> = BitRuns::new(&words, 100).collect();
        assert_eq!(clipped, vec![48..100]);

        let full = [u64::MAX; 2];
        assert_eq!(BitRuns::new(&full, 128).collect::<Vec<_>>(), vec![0..128]);
        assert_eq!(BitRuns::new(&full, 0).count(), 0);
    }

    #[test]
    fn test_runs_random_against_naive() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..500 {
            let len = rng.usize(0..=320);
            let density = rng.u32(1..=9);
            let bits: Vec<bool> = (0..len).map(|_| rng.u32(0..10) < density).collect();
            let mut words = vec![0u64; len.div_ceil(64).max(1)];
            for (i, _) in bits.iter().enumerate().filter(|(_, b)| **b) {
                words[i / 64] |= 1 << (i % 64);
            }
            let runs: Vec<_> = BitRuns::new(&words, len).collect();
            assert_eq!(runs, naive_runs(&bits));

            let mut rebuilt = vec![0u64; words.len()];
            for run in &runs {
                set_bit_range(&mut rebuilt, run.clone());
            }
            assert_eq!(rebuilt, words);
        }
    }
}
