//! Deterministic segmentation of a partition's run list.
//!
//! The layout of a partition is a pure function of its members and the format:
//!
//! 1. Runs separated by a dominant gap of at least `dominant_run_threshold` bits
//!    start a new candidate segment. A candidate spans from its first rare bit to
//!    its last.
//! 2. A candidate longer than `max_segment_len_hint` is cut at inner gaps. Each cut
//!    closes the longest prefix that fits the hint. When no prefix fits, the cut
//!    comes after the first run. A candidate without inner gaps stays whole.
//! 3. A piece consisting of exactly one run of at least `rare_run_threshold` bits
//!    is a uniform run; every other piece is mixed.
//!
//! The encoder uses [`plan_segments`] to build segments and the canon validator
//! uses it to re-derive them from decoded bits.

use std::ops::Range;

use canonset_bits::set_bit_range;
use canonset_format::{FormatSpec, SegmentKind};

/// Position, extent and kind of one segment, plus the runs it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLayout {
    pub start: u64,
    pub len: u64,
    pub kind: SegmentKind,
    /// Indices into the partition's run list.
    pub runs: Range<usize>,
}

impl SegmentLayout {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Splits a normalized, non-empty-runs list into canonical segments.
pub fn plan_segments(runs: &[Range<u64>], format: &FormatSpec) -> Vec<SegmentLayout> {
    let mut layouts = Vec::new();
    let mut group_start = 0;
    for i in 1..=runs.len() {
        let boundary =
            i == runs.len() || runs[i].start - runs[i - 1].end >= format.dominant_run_threshold;
        if boundary {
            split_candidate(runs, group_start..i, format, &mut layouts);
            group_start = i;
        }
    }
    layouts
}

fn split_candidate(
    runs: &[Range<u64>],
    candidate: Range<usize>,
    format: &FormatSpec,
    layouts: &mut Vec<SegmentLayout>,
) {
    let hint = format.max_segment_len_hint;
    let last = candidate.end - 1;
    let mut lo = candidate.start;
    loop {
        let first = runs[lo].start;
        if lo == last || runs[last].end - first <= hint {
            layouts.push(layout(runs, lo..candidate.end, format));
            return;
        }
        // Cut points sit after runs lo..last; their prefix ends grow monotonically.
        let fitting = runs[lo..last].partition_point(|r| r.end - first <= hint);
        let cut = if fitting > 0 { lo + fitting - 1 } else { lo };
        layouts.push(layout(runs, lo..cut + 1, format));
        lo = cut + 1;
    }
}

fn layout(runs: &[Range<u64>], piece: Range<usize>, format: &FormatSpec) -> SegmentLayout {
    let start = runs[piece.start].start;
    let end = runs[piece.end - 1].end;
    let len = end - start;
    let kind = if piece.len() == 1 && len >= format.rare_run_threshold {
        SegmentKind::Uniform
    } else {
        SegmentKind::Mixed
    };
    SegmentLayout {
        start,
        len,
        kind,
        runs: piece,
    }
}

/// Bit pattern of a mixed segment as chunk-sized words; bit 0 of word 0 is the
/// segment's first offset.
pub fn chunk_words(
    runs: &[Range<u64>],
    layout: &SegmentLayout,
    format: &FormatSpec,
) -> Vec<u64> {
    debug_assert_eq!(format.chunk_bits, 64);
    let mut words = vec![0u64; format.chunk_count(layout.len) as usize];
    for run in &runs[layout.runs.clone()] {
        let from = (run.start - layout.start) as usize;
        let to = (run.end - layout.start) as usize;
        set_bit_range(&mut words, from..to);
    }
    words
}

#[cfg(test)]
mod tests {
    use canonset_format::FORMAT_0;

    use super::*;

    fn kinds(layouts: &[SegmentLayout]) -> Vec<(u64, u64, SegmentKind)> {
        layouts.iter().map(|l| (l.start, l.len, l.kind)).collect()
    }

    #[test]
    fn test_single_sparse_segment() {
        let runs = [5..6, 10..11, 15..16];
        let layouts = plan_segments(&runs, &FORMAT_0);
        assert_eq!(kinds(&layouts), vec![(5, 11, SegmentKind::Mixed)]);
        let words = chunk_words(&runs, &layouts[0], &FORMAT_0);
        assert_eq!(words, vec![0b100_0010_0001]);
    }

    #[test]
    fn test_dominant_gap_threshold() {
        // Gap of 95 keeps one segment, gap of 96 splits.
        let runs = [0..1, 96..97];
        assert_eq!(plan_segments(&runs, &FORMAT_0).len(), 1);
        let runs = [0..1, 97..98];
        assert_eq!(
            kinds(&plan_segments(&runs, &FORMAT_0)),
            vec![(0, 1, SegmentKind::Mixed), (97, 1, SegmentKind::Mixed)]
        );
    }

    #[test]
    fn test_uniform_threshold() {
        assert_eq!(
            kinds(&plan_segments(&[100..164], &FORMAT_0)),
            vec![(100, 64, SegmentKind::Uniform)]
        );
        assert_eq!(
            kinds(&plan_segments(&[100..163], &FORMAT_0)),
            vec![(100, 63, SegmentKind::Mixed)]
        );
        // A long run next to another run within the gap threshold stays mixed.
        assert_eq!(
            kinds(&plan_segments(&[0..100, 110..111], &FORMAT_0)),
            vec![(0, 111, SegmentKind::Mixed)]
        );
    }

    #[test]
    fn test_hint_prefers_cut_before_hint() {
        // Singletons every 50 bits: the candidate spans far beyond 2048 bits.
        let runs: Vec<_> = (0..100u64).map(|i| i * 50..i * 50 + 1).collect();
        let layouts = plan_segments(&runs, &FORMAT_0);
        // Run 40 starts at 2000 and ends at 2001 <= 2048; run 41 would end at 2051.
        assert_eq!(layouts[0].start, 0);
        assert_eq!(layouts[0].len, 2001);
        assert_eq!(layouts[0].runs, 0..41);
        assert_eq!(layouts[1].start, 2050);
        for l in &layouts {
            assert!(l.len <= FORMAT_0.max_segment_len_hint);
            assert_eq!(l.kind, SegmentKind::Mixed);
        }
        let covered: usize = layouts.iter().map(|l| l.runs.len()).sum();
        assert_eq!(covered, runs.len());
    }

    #[test]
    fn test_hint_falls_back_to_cut_after_hint() {
        // The first run alone exceeds the hint; the cut follows it.
        let runs = [0..3000, 3010..3011, 3020..3021];
        assert_eq!(
            kinds(&plan_segments(&runs, &FORMAT_0)),
            vec![
                (0, 3000, SegmentKind::Uniform),
                (3010, 11, SegmentKind::Mixed)
            ]
        );
    }

    #[test]
    fn test_oversized_single_run() {
        let full = 0..(1u64 << 32);
        assert_eq!(
            kinds(&plan_segments(std::slice::from_ref(&full), &FORMAT_0)),
            vec![(0, 1 << 32, SegmentKind::Uniform)]
        );
    }

    #[test]
    fn test_mixed_segments_never_exceed_hint() {
        let mut rng = fastrand::Rng::with_seed(99);
        for _ in 0..200 {
            let mut runs = Vec::new();
            let mut pos = rng.u64(0..100);
            for _ in 0..rng.usize(1..200) {
                let len = if rng.bool() { rng.u64(1..8) } else { rng.u64(1..3000) };
                runs.push(pos..pos + len);
                pos += len + rng.u64(1..150);
            }
            let layouts = plan_segments(&runs, &FORMAT_0);
            let mut next_run = 0;
            for l in &layouts {
                assert_eq!(l.runs.start, next_run);
                next_run = l.runs.end;
                if l.kind == SegmentKind::Mixed {
                    assert!(l.len <= FORMAT_0.max_segment_len_hint);
                } else {
                    assert_eq!(l.runs.len(), 1);
                }
            }
            assert_eq!(next_run, runs.len());
        }
    }
}
