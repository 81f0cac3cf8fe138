//! In-memory form of an identifier set: partitions, segments and chunks.
//!
//! A [`DecodedSet`] always holds the canonical layout of its members. Every path
//! that changes membership (construction from ids, incremental mutation, set
//! algebra) re-derives the affected partitions through the same segmentation the
//! encoder uses, so encoding is a plain walk over the stored structure.

use std::ops::{Range, RangeInclusive};

use canonset_bits::BitRuns;
use canonset_common::{Result, error::Error};
use canonset_format::{FormatSpec, SegmentKind};
use itertools::{Either, Itertools};

use crate::{
    arena::{Arena, Span},
    runs::{push_run, run_cardinality, runs_from_offsets},
    segmenter::{chunk_words, plan_segments},
    tokens::Chunk,
};

/// Garbage arena entries tolerated before compaction is considered at all.
const COMPACTION_MIN_GARBAGE: usize = 4096;

/// Upper bounds on the structure a [`DecodedSet`] may grow to.
///
/// Applied on decode and on every growth path. A violation fails with a capacity
/// error and leaves the set unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLimits {
    pub max_partitions: u32,
    pub max_segments: u32,
    pub max_chunks: u32,
}

impl Default for CapacityLimits {
    fn default() -> Self {
        CapacityLimits {
            max_partitions: u32::MAX,
            max_segments: u32::MAX,
            max_chunks: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) start: u64,
    pub(crate) len: u64,
    pub(crate) kind: SegmentKind,
    pub(crate) chunks: Span<Chunk>,
    pub(crate) cardinality: u64,
}

impl Segment {
    fn end(&self) -> u64 {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PartitionEntry {
    pub(crate) id: u32,
    pub(crate) segments: Span<Segment>,
    pub(crate) cardinality: u64,
}

/// A segment built outside the arenas, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedSegment {
    pub(crate) start: u64,
    pub(crate) len: u64,
    pub(crate) kind: SegmentKind,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) cardinality: u64,
}

/// A partition built outside the arenas, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedPartition {
    pub(crate) id: u32,
    pub(crate) segments: Vec<StagedSegment>,
}

impl StagedPartition {
    /// Builds the canonical segments and chunks for a partition's run list.
    pub(crate) fn from_runs(
        id: u32,
        runs: &[Range<u64>],
        format: &FormatSpec,
    ) -> Result<StagedPartition> {
        let segments = plan_segments(runs, format)
            .into_iter()
            .map(|layout| {
                let chunks = match layout.kind {
                    SegmentKind::Uniform => Vec::new(),
                    SegmentKind::Mixed => chunk_words(runs, &layout, format)
                        .into_iter()
                        .enumerate()
                        .map(|(i, bits)| {
                            Chunk::classify(bits, format.chunk_width(layout.len, i as u64), format)
                        })
                        .collect::<Result<Vec<_>>>()?,
                };
                Ok(StagedSegment {
                    start: layout.start,
                    len: layout.len,
                    kind: layout.kind,
                    chunks,
                    cardinality: run_cardinality(&runs[layout.runs.clone()]),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StagedPartition { id, segments })
    }

    fn chunk_count(&self) -> usize {
        self.segments.iter().map(|s| s.chunks.len()).sum()
    }
}

/// A set of 64-bit identifiers in its canonical hierarchical layout.
///
/// Partitions are kept in ascending id order and are never empty. Segments and
/// chunks live in two arenas and are referenced through [`Span`]s.
#[derive(Clone)]
pub struct DecodedSet {
    format: &'static FormatSpec,
    limits: CapacityLimits,
    partitions: Vec<PartitionEntry>,
    segments: Arena<Segment>,
    chunks: Arena<Chunk>,
    live_segments: usize,
    live_chunks: usize,
}

impl DecodedSet {
    /// Creates an empty set in the current format.
    pub fn new() -> DecodedSet {
        Self::with_format(FormatSpec::current(), CapacityLimits::default())
    }

    pub fn with_limits(limits: CapacityLimits) -> DecodedSet {
        Self::with_format(FormatSpec::current(), limits)
    }

    pub fn with_format(format: &'static FormatSpec, limits: CapacityLimits) -> DecodedSet {
        DecodedSet {
            format,
            limits,
            partitions: Vec::new(),
            segments: Arena::new(),
            chunks: Arena::new(),
            live_segments: 0,
            live_chunks: 0,
        }
    }

    /// Builds a set from identifiers in any order; duplicates are ignored.
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Result<DecodedSet> {
        Self::from_ids_with_limits(ids, CapacityLimits::default())
    }

    pub fn from_ids_with_limits(
        ids: impl IntoIterator<Item = u64>,
        limits: CapacityLimits,
    ) -> Result<DecodedSet> {
        let mut ids = ids.into_iter().collect::<Vec<_>>();
        ids.sort_unstable();
        ids.dedup();

        let mut set = DecodedSet::with_limits(limits);
        let format = set.format;
        for (partition, members) in &ids.iter().chunk_by(|&&id| format.partition_of(id)) {
            let runs = runs_from_offsets(members.map(|&id| format.offset_of(id)));
            set.push_runs(partition as u32, &runs)?;
        }
        Ok(set)
    }

    /// Builds a set from inclusive identifier ranges in any order. Overlapping
    /// and touching ranges are merged; empty ranges are ignored.
    ///
    /// Unlike [`DecodedSet::from_ids`], this never expands the ranges into
    /// individual identifiers, so a range may span whole partitions.
    pub fn from_ranges(ranges: impl IntoIterator<Item = RangeInclusive<u64>>) -> Result<DecodedSet> {
        let mut ranges = ranges
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|r| (*r.start(), *r.end()))
            .collect::<Vec<_>>();
        ranges.sort_unstable();

        // Merged ranges are disjoint and never touch, so the pieces below visit
        // partitions in ascending order.
        let merged = ranges.into_iter().coalesce(|(a_start, a_end), (b_start, b_end)| {
            if a_end.checked_add(1).is_none_or(|next| b_start <= next) {
                Ok((a_start, a_end.max(b_end)))
            } else {
                Err(((a_start, a_end), (b_start, b_end)))
            }
        });

        let mut set = DecodedSet::new();
        let format = set.format;
        let mut current: Option<u64> = None;
        let mut runs: Vec<Range<u64>> = Vec::new();
        for (start, end) in merged {
            let mut lo = start;
            loop {
                let partition = format.partition_of(lo);
                let hi = end.min(lo | (format.partition_len() - 1));
                if current != Some(partition) {
                    if let Some(prev) = current {
                        set.push_runs(prev as u32, &runs)?;
                        runs.clear();
                    }
                    current = Some(partition);
                }
                runs.push(format.offset_of(lo)..format.offset_of(hi) + 1);
                if hi == end {
                    break;
                }
                lo = hi + 1;
            }
        }
        if let Some(prev) = current {
            set.push_runs(prev as u32, &runs)?;
        }
        Ok(set)
    }

    pub fn format(&self) -> &'static FormatSpec {
        self.format
    }

    pub fn limits(&self) -> CapacityLimits {
        self.limits
    }

    /// Number of members.
    pub fn cardinality(&self) -> u64 {
        self.partitions.iter().map(|p| p.cardinality).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of live segments across all partitions.
    pub fn segment_count(&self) -> usize {
        self.live_segments
    }

    /// Number of live chunks across all mixed segments.
    pub fn chunk_count(&self) -> usize {
        self.live_chunks
    }

    pub fn contains(&self, id: u64) -> bool {
        let Ok(idx) = self.find_partition(self.format.partition_of(id)) else {
            return false;
        };
        self.partition_ref(&self.partitions[idx])
            .contains_offset(self.format.offset_of(id))
    }

    /// Number of members strictly below `id`.
    pub fn rank(&self, id: u64) -> u64 {
        let (idx, inside) = match self.find_partition(self.format.partition_of(id)) {
            Ok(idx) => (idx, true),
            Err(idx) => (idx, false),
        };
        let below: u64 = self.partitions[..idx].iter().map(|p| p.cardinality).sum();
        if !inside {
            return below;
        }
        below
            + self
                .partition_ref(&self.partitions[idx])
                .rank_offset(self.format.offset_of(id))
    }

    /// Members in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.partitions().flat_map(|p| {
            let base = p.base();
            p.runs()
                .into_iter()
                .flat_map(move |run| run.map(move |offset| base + offset))
        })
    }

    /// Members as ascending, non-touching inclusive ranges of identifiers.
    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<u64>> + '_ {
        self.partitions().flat_map(|p| {
            let base = p.base();
            p.runs()
                .into_iter()
                .map(move |run| base + run.start..=base + (run.end - 1))
        })
        .coalesce(|a, b| {
            if a.end().checked_add(1) == Some(*b.start()) {
                Ok(*a.start()..=*b.end())
            } else {
                Err((a, b))
            }
        })
    }

    pub fn partitions(&self) -> impl ExactSizeIterator<Item = PartitionRef<'_>> + '_ {
        self.partitions.iter().map(|p| self.partition_ref(p))
    }

    /// Adds `id`. Returns `false` if it was already a member.
    pub fn insert(&mut self, id: u64) -> Result<bool> {
        if self.contains(id) {
            return Ok(false);
        }
        let partition = self.format.partition_of(id);
        let offset = self.format.offset_of(id);
        let position = self.find_partition(partition);
        let mut runs = match position {
            Ok(idx) => self.partition_ref(&self.partitions[idx]).runs(),
            Err(_) => Vec::new(),
        };
        let at = runs.partition_point(|r| r.start <= offset);
        runs.insert(at, offset..offset + 1);
        let runs = normalize(runs);

        let staged = StagedPartition::from_runs(partition as u32, &runs, self.format)?;
        self.replace_partition(position, Some(staged))?;
        log::trace!("inserted {id} into partition {partition}");
        Ok(true)
    }

    /// Removes `id`. Returns `false` if it was not a member.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        if !self.contains(id) {
            return Ok(false);
        }
        let partition = self.format.partition_of(id);
        let offset = self.format.offset_of(id);
        let Ok(idx) = self.find_partition(partition) else {
            return Ok(false);
        };
        let runs = self
            .partition_ref(&self.partitions[idx])
            .runs()
            .into_iter()
            .flat_map(|r| {
                [
                    r.start..offset.clamp(r.start, r.end),
                    (offset + 1).clamp(r.start, r.end)..r.end,
                ]
            })
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>();

        let staged = if runs.is_empty() {
            None
        } else {
            Some(StagedPartition::from_runs(partition as u32, &runs, self.format)?)
        };
        self.replace_partition(Ok(idx), staged)?;
        log::trace!("removed {id} from partition {partition}");
        Ok(true)
    }

    /// Whether every member of `self` is a member of `other`.
    pub fn is_subset(&self, other: &DecodedSet) -> bool {
        self.partitions().all(|p| {
            let Ok(idx) = other.find_partition(p.id() as u64) else {
                return false;
            };
            let theirs = other.partition_ref(&other.partitions[idx]).runs();
            p.runs().iter().all(|run| {
                let at = theirs.partition_point(|r| r.end <= run.start);
                theirs
                    .get(at)
                    .is_some_and(|r| r.start <= run.start && run.end <= r.end)
            })
        })
    }

    /// Appends a partition after all existing ones, built from its run list.
    /// An empty run list adds nothing.
    pub(crate) fn push_runs(&mut self, id: u32, runs: &[Range<u64>]) -> Result<()> {
        if runs.is_empty() {
            return Ok(());
        }
        let staged = StagedPartition::from_runs(id, runs, self.format)?;
        self.push_staged(staged)
    }

    /// Appends a fully built partition after all existing ones.
    pub(crate) fn push_staged(&mut self, staged: StagedPartition) -> Result<()> {
        debug_assert!(self.partitions.last().is_none_or(|p| p.id < staged.id));
        let position = Err(self.partitions.len());
        self.replace_partition(position, Some(staged))
    }

    /// Fails with a capacity error if growing by the given amounts would exceed a
    /// limit. Used by the decoder before it materializes claimed structure.
    pub(crate) fn check_growth(
        &self,
        partitions: usize,
        segments: usize,
        chunks: usize,
    ) -> Result<()> {
        let checks = [
            (
                "partitions",
                self.partitions.len() + partitions,
                self.limits.max_partitions,
            ),
            (
                "segments",
                self.live_segments + segments,
                self.limits.max_segments,
            ),
            ("chunks", self.live_chunks + chunks, self.limits.max_chunks),
        ];
        for (resource, total, limit) in checks {
            if total > limit as usize {
                return Err(Error::capacity(resource, limit as u64));
            }
        }
        Ok(())
    }

    pub(crate) fn partition_ref<'a>(&'a self, entry: &'a PartitionEntry) -> PartitionRef<'a> {
        PartitionRef { set: self, entry }
    }

    fn find_partition(&self, partition: u64) -> std::result::Result<usize, usize> {
        if partition > u32::MAX as u64 {
            return Err(self.partitions.len());
        }
        self.partitions
            .binary_search_by_key(&(partition as u32), |p| p.id)
    }

    fn segments_of(&self, entry: &PartitionEntry) -> &[Segment] {
        &self.segments[entry.segments]
    }

    /// Replaces the partition at `position` (`Ok` for an existing index, `Err` for
    /// an insertion point) with `staged`, or deletes it when `staged` is `None`.
    ///
    /// Limits are checked and arena entries allocated before any visible state
    /// changes; on error the set is logically unchanged.
    fn replace_partition(
        &mut self,
        position: std::result::Result<usize, usize>,
        staged: Option<StagedPartition>,
    ) -> Result<()> {
        let (old_segments, old_chunks) = match position {
            Ok(idx) => {
                let segments = self.segments_of(&self.partitions[idx]);
                (
                    segments.len(),
                    segments.iter().map(|s| s.chunks.len()).sum::<usize>(),
                )
            }
            Err(_) => (0, 0),
        };
        let (new_segments, new_chunks) = staged
            .as_ref()
            .map_or((0, 0), |s| (s.segments.len(), s.chunk_count()));
        let new_partitions = match (position, staged.is_some()) {
            (Err(_), true) => 1,
            _ => 0,
        };
        self.check_growth(
            new_partitions,
            new_segments.saturating_sub(old_segments),
            new_chunks.saturating_sub(old_chunks),
        )?;

        let entry = staged.map(|staged| self.alloc_partition(staged)).transpose()?;

        self.live_segments = self.live_segments - old_segments + new_segments;
        self.live_chunks = self.live_chunks - old_chunks + new_chunks;
        match (position, entry) {
            (Ok(idx), Some(entry)) => self.partitions[idx] = entry,
            (Ok(idx), None) => {
                self.partitions.remove(idx);
            }
            (Err(idx), Some(entry)) => self.partitions.insert(idx, entry),
            (Err(_), None) => {}
        }
        self.maybe_compact()
    }

    fn alloc_partition(&mut self, staged: StagedPartition) -> Result<PartitionEntry> {
        let mut segments = Vec::with_capacity(staged.segments.len());
        let mut cardinality = 0;
        for segment in staged.segments {
            let chunks = if segment.chunks.is_empty() {
                Span::EMPTY
            } else {
                self.chunks.alloc(segment.chunks)?
            };
            cardinality += segment.cardinality;
            segments.push(Segment {
                start: segment.start,
                len: segment.len,
                kind: segment.kind,
                chunks,
                cardinality: segment.cardinality,
            });
        }
        Ok(PartitionEntry {
            id: staged.id,
            segments: self.segments.alloc(segments)?,
            cardinality,
        })
    }

    /// Rebuilds both arenas from live entries once garbage outweighs them.
    fn maybe_compact(&mut self) -> Result<()> {
        let garbage = (self.segments.len() - self.live_segments)
            + (self.chunks.len() - self.live_chunks);
        let live = self.live_segments + self.live_chunks;
        if garbage < COMPACTION_MIN_GARBAGE || garbage <= live {
            return Ok(());
        }

        let mut segments = Arena::with_capacity(self.live_segments);
        let mut chunks = Arena::with_capacity(self.live_chunks);
        let mut partitions = Vec::with_capacity(self.partitions.len());
        for entry in &self.partitions {
            let mut moved = Vec::with_capacity(entry.segments.len());
            for segment in self.segments_of(entry) {
                let span = if segment.chunks.is_empty() {
                    Span::EMPTY
                } else {
                    chunks.alloc(self.chunks[segment.chunks].iter().copied())?
                };
                moved.push(Segment {
                    chunks: span,
                    ..*segment
                });
            }
            partitions.push(PartitionEntry {
                segments: segments.alloc(moved)?,
                ..*entry
            });
        }
        log::debug!(
            "compacted arenas: {} garbage entries dropped, {} live",
            garbage,
            live
        );
        self.segments = segments;
        self.chunks = chunks;
        self.partitions = partitions;
        Ok(())
    }
}

impl Default for DecodedSet {
    fn default() -> Self {
        DecodedSet::new()
    }
}

impl PartialEq for DecodedSet {
    /// Logical equality: same format and same members.
    fn eq(&self, other: &Self) -> bool {
        self.format.version == other.format.version
            && self.partitions.len() == other.partitions.len()
            && self.partitions().zip(other.partitions()).all(|(a, b)| {
                a.id() == b.id()
                    && a.cardinality() == b.cardinality()
                    && a.segments().zip_longest(b.segments()).all(|pair| {
                        pair.both().is_some_and(|(x, y)| {
                            x.start() == y.start()
                                && x.len() == y.len()
                                && x.kind() == y.kind()
                                && x.chunks() == y.chunks()
                        })
                    })
            })
    }
}

impl Eq for DecodedSet {}

impl std::fmt::Debug for DecodedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedSet")
            .field("format", &self.format.version)
            .field("cardinality", &self.cardinality())
            .field("partitions", &self.partitions.len())
            .field("segments", &self.live_segments)
            .field("chunks", &self.live_chunks)
            .finish()
    }
}

/// Read-only view of one partition.
#[derive(Clone, Copy)]
pub struct PartitionRef<'a> {
    set: &'a DecodedSet,
    entry: &'a PartitionEntry,
}

impl<'a> PartitionRef<'a> {
    pub fn id(&self) -> u32 {
        self.entry.id
    }

    /// Smallest identifier covered by the partition.
    pub fn base(&self) -> u64 {
        (self.entry.id as u64) << self.set.format.partition_bits
    }

    pub fn cardinality(&self) -> u64 {
        self.entry.cardinality
    }

    pub fn segment_count(&self) -> usize {
        self.entry.segments.len()
    }

    pub fn segments(&self) -> impl ExactSizeIterator<Item = SegmentRef<'a>> + 'a {
        let set = self.set;
        set.segments_of(self.entry)
            .iter()
            .map(move |segment| SegmentRef { set, segment })
    }

    /// The partition's members as a normalized run list of offsets.
    pub fn runs(&self) -> Vec<Range<u64>> {
        let mut runs = Vec::new();
        for segment in self.segments() {
            for run in segment.runs() {
                push_run(&mut runs, run);
            }
        }
        runs
    }

    fn raw_segments(&self) -> &'a [Segment] {
        self.set.segments_of(self.entry)
    }

    fn contains_offset(&self, offset: u64) -> bool {
        let segments = self.raw_segments();
        let idx = segments.partition_point(|s| s.end() <= offset);
        segments
            .get(idx)
            .filter(|s| s.start <= offset)
            .is_some_and(|segment| {
                SegmentRef {
                    set: self.set,
                    segment,
                }
                .contains_offset(offset)
            })
    }

    fn rank_offset(&self, offset: u64) -> u64 {
        let segments = self.raw_segments();
        let idx = segments.partition_point(|s| s.end() <= offset);
        let below: u64 = segments[..idx].iter().map(|s| s.cardinality).sum();
        match segments.get(idx) {
            Some(segment) if segment.start < offset => {
                below
                    + SegmentRef {
                        set: self.set,
                        segment,
                    }
                    .rank_offset(offset)
            }
            _ => below,
        }
    }
}

impl std::fmt::Debug for PartitionRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionRef")
            .field("id", &self.id())
            .field("cardinality", &self.cardinality())
            .field("segments", &self.segment_count())
            .finish()
    }
}

/// Read-only view of one segment. Offsets are relative to the partition.
#[derive(Clone, Copy)]
pub struct SegmentRef<'a> {
    set: &'a DecodedSet,
    segment: &'a Segment,
}

impl<'a> SegmentRef<'a> {
    pub fn start(&self) -> u64 {
        self.segment.start
    }

    pub fn len(&self) -> u64 {
        self.segment.len
    }

    /// Segments always cover at least one bit.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn end(&self) -> u64 {
        self.segment.end()
    }

    pub fn kind(&self) -> SegmentKind {
        self.segment.kind
    }

    pub fn cardinality(&self) -> u64 {
        self.segment.cardinality
    }

    /// Chunks of a mixed segment; empty for a uniform run.
    pub fn chunks(&self) -> &'a [Chunk] {
        &self.set.chunks[self.segment.chunks]
    }

    /// Member offsets of the segment as maximal runs.
    pub fn runs(&self) -> impl Iterator<Item = Range<u64>> + 'a {
        let start = self.start();
        match self.kind() {
            SegmentKind::Uniform => Either::Left(std::iter::once(start..self.end())),
            SegmentKind::Mixed => {
                let words = self.chunks().iter().map(Chunk::bits).collect::<Vec<_>>();
                let len = self.len() as usize;
                let runs = BitRuns::new(&words, len)
                    .map(|r| start + r.start as u64..start + r.end as u64)
                    .collect::<Vec<_>>();
                Either::Right(runs.into_iter())
            }
        }
    }

    fn contains_offset(&self, offset: u64) -> bool {
        match self.kind() {
            SegmentKind::Uniform => true,
            SegmentKind::Mixed => {
                let (chunk, bit) = self.locate(offset);
                (self.chunks()[chunk].bits() >> bit) & 1 != 0
            }
        }
    }

    /// Members in `[start, offset)`; `offset` must lie inside the segment.
    fn rank_offset(&self, offset: u64) -> u64 {
        match self.kind() {
            SegmentKind::Uniform => offset - self.start(),
            SegmentKind::Mixed => {
                let (chunk, bit) = self.locate(offset);
                let chunks = self.chunks();
                let full: u64 = chunks[..chunk].iter().map(|c| c.popcount() as u64).sum();
                full + (chunks[chunk].bits() & canonset_bits::low_mask(bit)).count_ones() as u64
            }
        }
    }

    fn locate(&self, offset: u64) -> (usize, u32) {
        let chunk_bits = self.set.format.chunk_bits as u64;
        let rel = offset - self.start();
        ((rel / chunk_bits) as usize, (rel % chunk_bits) as u32)
    }
}

impl std::fmt::Debug for SegmentRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentRef")
            .field("start", &self.start())
            .field("len", &self.len())
            .field("kind", &self.kind())
            .field("cardinality", &self.cardinality())
            .finish()
    }
}

/// Sorts and merges an almost-normalized run list (one run inserted out of place).
fn normalize(runs: Vec<Range<u64>>) -> Vec<Range<u64>> {
    let mut out: Vec<Range<u64>> = Vec::with_capacity(runs.len());
    for run in runs {
        match out.last_mut() {
            Some(last) if run.start <= last.end => last.end = last.end.max(run.end),
            _ => out.push(run),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ids_layout() {
        let set = DecodedSet::from_ids([15, 5, 10, 5, (3 << 32) + 1]).unwrap();
        assert_eq!(set.cardinality(), 4);
        assert_eq!(set.partition_count(), 2);
        let partitions: Vec<_> = set.partitions().collect();
        assert_eq!(partitions[0].id(), 0);
        assert_eq!(partitions[1].id(), 3);
        assert_eq!(partitions[1].base(), 3 << 32);
        let segment = partitions[0].segments().next().unwrap();
        assert_eq!((segment.start(), segment.len()), (5, 11));
        assert_eq!(segment.kind(), SegmentKind::Mixed);
        assert_eq!(segment.chunks().len(), 1);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![5, 10, 15, (3 << 32) + 1]);
    }

    #[test]
    fn test_contains_and_rank() {
        let ids: Vec<u64> = (100..300).chain([1_000, 5_000, u64::MAX]).collect();
        let set = DecodedSet::from_ids(ids.iter().copied()).unwrap();
        for probe in [0, 99, 100, 150, 299, 300, 999, 1_000, 1_001, 5_000, u64::MAX - 1, u64::MAX] {
            assert_eq!(set.contains(probe), ids.contains(&probe), "{probe}");
            let expected = ids.iter().filter(|&&id| id < probe).count() as u64;
            assert_eq!(set.rank(probe), expected, "{probe}");
        }
        assert_eq!(
            set.ranges().collect::<Vec<_>>(),
            vec![100..=299, 1_000..=1_000, 5_000..=5_000, u64::MAX..=u64::MAX]
        );
    }

    #[test]
    fn test_insert_remove_match_direct_build() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut set = DecodedSet::new();
        let mut model = std::collections::BTreeSet::new();
        for _ in 0..3_000 {
            let id = if rng.bool() {
                rng.u64(0..4_000)
            } else {
                (rng.u64(0..3) << 32) | rng.u64(0..200)
            };
            if rng.u8(..) < 170 {
                assert_eq!(set.insert(id).unwrap(), model.insert(id));
            } else {
                assert_eq!(set.remove(id).unwrap(), model.remove(&id));
            }
        }
        let direct = DecodedSet::from_ids(model.iter().copied()).unwrap();
        assert_eq!(set, direct);
        assert_eq!(set.cardinality(), model.len() as u64);
        assert_eq!(set.ids().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_last_member_drops_partition() {
        let mut set = DecodedSet::from_ids([1 << 40]).unwrap();
        assert!(set.remove(1 << 40).unwrap());
        assert!(set.is_empty());
        assert_eq!(set.segment_count(), 0);
        assert_eq!(set.chunk_count(), 0);
        assert!(!set.remove(1 << 40).unwrap());
    }

    #[test]
    fn test_capacity_limits_leave_set_unchanged() {
        let limits = CapacityLimits {
            max_partitions: 2,
            ..Default::default()
        };
        let mut set = DecodedSet::from_ids_with_limits([1, 1 << 32], limits).unwrap();
        let err = set.insert(2 << 32).unwrap_err();
        assert!(matches!(
            err.kind(),
            canonset_common::error::ErrorKind::Capacity { limit: 2, .. }
        ));
        assert_eq!(set.ids().collect::<Vec<_>>(), vec![1, 1 << 32]);
        // Growth inside an existing partition is still allowed.
        assert!(set.insert(2).unwrap());

        let limits = CapacityLimits {
            max_chunks: 1,
            ..Default::default()
        };
        let mut set = DecodedSet::from_ids_with_limits([0], limits).unwrap();
        assert!(set.insert(1_000).unwrap_err().kind().to_string().contains("chunks"));
        assert_eq!(set.cardinality(), 1);
        assert!(DecodedSet::from_ids_with_limits([0, 1_000], limits).is_err());
    }

    #[test]
    fn test_compaction_keeps_contents() {
        let mut set = DecodedSet::new();
        for i in 0..6_000u64 {
            set.insert(i * 7 % 3_001).unwrap();
        }
        let live = set.live_segments + set.live_chunks;
        assert!(set.segments.len() + set.chunks.len() <= 2 * live + COMPACTION_MIN_GARBAGE);
        let direct = DecodedSet::from_ids((0..6_000u64).map(|i| i * 7 % 3_001)).unwrap();
        assert_eq!(set, direct);
    }

    #[test]
    fn test_from_ranges_merges_and_spans_partitions() {
        let set = DecodedSet::from_ranges([10..=20, 15..=30, 31..=31, 5..=4]).unwrap();
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![10..=31]);

        let top = u64::MAX - 5..=u64::MAX;
        let wide = (1u64 << 32) - 3..=(2u64 << 32) + 2;
        let set = DecodedSet::from_ranges([top.clone(), wide.clone()]).unwrap();
        assert_eq!(set.partition_count(), 4);
        assert_eq!(set.cardinality(), (1u64 << 32) + 6 + 6);
        assert!(set.contains(u64::MAX) && set.contains(1 << 32) && !set.contains(0));
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![wide, top]);
        assert_eq!(crate::decode(&crate::encode(&set).unwrap()).unwrap(), set);
    }

    #[test]
    fn test_from_ranges_nested_in_wide_range() {
        let set = DecodedSet::from_ranges([0..=(2u64 << 32), 5..=10, (1u64 << 32)..=(1u64 << 32) + 3])
            .unwrap();
        assert_eq!(
            set.partitions().map(|p| p.id()).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(set.cardinality(), (2u64 << 32) + 1);
        assert_eq!(set.ranges().collect::<Vec<_>>(), vec![0..=(2u64 << 32)]);
        crate::validate(&set).unwrap();
        assert_eq!(crate::decode(&crate::encode(&set).unwrap()).unwrap(), set);

        let top = DecodedSet::from_ranges([(u64::MAX - 10)..=u64::MAX, (u64::MAX - 3)..=(u64::MAX - 1)])
            .unwrap();
        assert_eq!(top.ranges().collect::<Vec<_>>(), vec![(u64::MAX - 10)..=u64::MAX]);
    }

    #[test]
    fn test_is_subset() {
        let a = DecodedSet::from_ids([1, 2, 3, 1 << 33]).unwrap();
        let b = DecodedSet::from_ids((0..10).chain([1 << 33])).unwrap();
        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(DecodedSet::new().is_subset(&a));
        assert!(a.is_subset(&a));
    }
}
