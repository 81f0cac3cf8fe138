//! Run lists: the ordered maximal ranges of member offsets within one partition.
//!
//! A normalized run list is strictly ascending, non-empty per run, and never has
//! two runs touching (`next.start > prev.end`). All producers in this crate emit
//! normalized lists, and the merge adapters below preserve normalization.

use std::{iter::Peekable, ops::Range};

/// Total number of offsets covered by `runs`.
pub fn run_cardinality(runs: &[Range<u64>]) -> u64 {
    runs.iter().map(|r| r.end - r.start).sum()
}

/// Whether `offset` falls inside one of the normalized `runs`.
pub fn runs_contain(runs: &[Range<u64>], offset: u64) -> bool {
    let idx = runs.partition_point(|r| r.end <= offset);
    runs.get(idx).is_some_and(|r| r.start <= offset)
}

/// Appends `run` to a normalized list whose last run ends at or before
/// `run.start`, merging the two when they touch.
pub fn push_run(runs: &mut Vec<Range<u64>>, run: Range<u64>) {
    debug_assert!(run.start < run.end);
    match runs.last_mut() {
        Some(last) if last.end == run.start => last.end = run.end,
        _ => runs.push(run),
    }
}

/// Builds a normalized run list from strictly ascending offsets.
pub fn runs_from_offsets(offsets: impl IntoIterator<Item = u64>) -> Vec<Range<u64>> {
    let mut runs = Vec::new();
    for offset in offsets {
        push_run(&mut runs, offset..offset + 1);
    }
    runs
}

/// Set union of two normalized run streams.
pub fn union_runs<L, R>(a: L, b: R) -> UnionRuns<L::IntoIter, R::IntoIter>
where
    L: IntoIterator<Item = Range<u64>>,
    R: IntoIterator<Item = Range<u64>>,
{
    UnionRuns {
        a: a.into_iter().peekable(),
        b: b.into_iter().peekable(),
    }
}

/// Set intersection of two normalized run streams.
pub fn intersect_runs<L, R>(a: L, b: R) -> IntersectRuns<L::IntoIter, R::IntoIter>
where
    L: IntoIterator<Item = Range<u64>>,
    R: IntoIterator<Item = Range<u64>>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    IntersectRuns {
        cur_a: a.next(),
        cur_b: b.next(),
        a,
        b,
    }
}

/// Set difference `a \ b` of two normalized run streams.
pub fn difference_runs<L, R>(a: L, b: R) -> DifferenceRuns<L::IntoIter, R::IntoIter>
where
    L: IntoIterator<Item = Range<u64>>,
    R: IntoIterator<Item = Range<u64>>,
{
    DifferenceRuns {
        a: a.into_iter(),
        b: b.into_iter().peekable(),
        pending: None,
    }
}

/// Iterator adapter behind [`union_runs`].
///
/// Overlapping or touching runs from either side are merged into one output run.
/// O(len(a) + len(b)), constant extra memory.
pub struct UnionRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    a: Peekable<I>,
    b: Peekable<J>,
}

impl<I, J> Iterator for UnionRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        let take_a = match (self.a.peek(), self.b.peek()) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(ra), Some(rb)) => ra.start <= rb.start,
        };
        let mut cur = if take_a { self.a.next()? } else { self.b.next()? };

        loop {
            let end = cur.end;
            if let Some(r) = self.a.next_if(|r| r.start <= end) {
                cur.end = cur.end.max(r.end);
            } else if let Some(r) = self.b.next_if(|r| r.start <= end) {
                cur.end = cur.end.max(r.end);
            } else {
                return Some(cur);
            }
        }
    }
}

/// Iterator adapter behind [`intersect_runs`].
pub struct IntersectRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    a: I,
    b: J,
    cur_a: Option<Range<u64>>,
    cur_b: Option<Range<u64>>,
}

impl<I, J> Iterator for IntersectRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        loop {
            let ra = self.cur_a.clone()?;
            let rb = self.cur_b.clone()?;

            if ra.end <= rb.start {
                self.cur_a = self.a.next();
                continue;
            }
            if rb.end <= ra.start {
                self.cur_b = self.b.next();
                continue;
            }

            let start = ra.start.max(rb.start);
            let end = ra.end.min(rb.end);
            // Whichever side ends first cannot overlap anything further.
            if ra.end == end {
                self.cur_a = self.a.next();
            }
            if rb.end == end {
                self.cur_b = self.b.next();
            }
            return Some(start..end);
        }
    }
}

/// Iterator adapter behind [`difference_runs`].
pub struct DifferenceRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    a: I,
    b: Peekable<J>,
    /// Unconsumed tail of the current `a` run.
    pending: Option<Range<u64>>,
}

impl<I, J> Iterator for DifferenceRuns<I, J>
where
    I: Iterator<Item = Range<u64>>,
    J: Iterator<Item = Range<u64>>,
{
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        loop {
            let mut cur = match self.pending.take() {
                Some(cur) => cur,
                None => self.a.next()?,
            };
            while self.b.next_if(|r| r.end <= cur.start).is_some() {}

            let Some(rb) = self.b.peek() else {
                return Some(cur);
            };
            if rb.start >= cur.end {
                return Some(cur);
            }
            if rb.start > cur.start {
                if rb.end < cur.end {
                    self.pending = Some(rb.end..cur.end);
                }
                return Some(cur.start..rb.start);
            }
            if rb.end < cur.end {
                cur.start = rb.end;
                self.pending = Some(cur);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(runs: &[Range<u64>]) -> Vec<u64> {
        runs.iter().flat_map(|r| r.clone()).collect()
    }

    fn random_runs(rng: &mut fastrand::Rng, universe: u64) -> Vec<Range<u64>> {
        let offsets = (0..universe).filter(|_| rng.u8(..) < 90);
        runs_from_offsets(offsets)
    }

    #[test]
    fn test_push_run_merges_touching() {
        let mut runs = vec![];
        push_run(&mut runs, 0..3);
        push_run(&mut runs, 3..5);
        push_run(&mut runs, 7..8);
        assert_eq!(runs, vec![0..5, 7..8]);
        assert_eq!(run_cardinality(&runs), 6);
        assert!(runs_contain(&runs, 4));
        assert!(!runs_contain(&runs, 5));
        assert!(runs_contain(&runs, 7));
        assert!(!runs_contain(&runs, 8));
    }

    #[test]
    fn test_union_merges_touching_across_sides() {
        let out: Vec<_> = union_runs(vec![0..2, 10..12], vec![2..4, 5..6]).collect();
        assert_eq!(out, vec![0..4, 5..6, 10..12]);
    }

    #[test]
    fn test_difference_splits_runs() {
        let out: Vec<_> = difference_runs(vec![0..10, 20..30], vec![2..3, 5..25]).collect();
        assert_eq!(out, vec![0..2, 3..5, 25..30]);
        let out: Vec<_> = difference_runs(vec![0..10], vec![0..10]).collect();
        assert!(out.is_empty());
    }

    #[test]
    fn test_random_against_naive() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..300 {
            let universe = rng.u64(1..400);
            let a = random_runs(&mut rng, universe);
            let b = random_runs(&mut rng, universe);
            let in_a = |x: &u64| runs_contain(&a, *x);
            let in_b = |x: &u64| runs_contain(&b, *x);

            let union: Vec<_> = union_runs(a.clone(), b.clone()).collect();
            let expected: Vec<u64> = (0..universe).filter(|x| in_a(x) || in_b(x)).collect();
            assert_eq!(naive(&union), expected);
            assert_eq!(union, runs_from_offsets(expected));

            let inter: Vec<_> = intersect_runs(a.clone(), b.clone()).collect();
            let expected: Vec<u64> = (0..universe).filter(|x| in_a(x) && in_b(x)).collect();
            assert_eq!(inter, runs_from_offsets(expected));

            let diff: Vec<_> = difference_runs(a.clone(), b.clone()).collect();
            let expected: Vec<u64> = (0..universe).filter(|x| in_a(x) && !in_b(x)).collect();
            assert_eq!(diff, runs_from_offsets(expected));
        }
    }
}
