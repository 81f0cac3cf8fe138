//! Union, intersection and difference of decoded sets.
//!
//! Partitions of both operands are merged by id. Partitions present on one side
//! only are taken over or dropped without looking at their contents; shared ones
//! combine their run lists and are re-segmented, so results are canonical.

use std::ops::Range;

use canonset_common::{Result, verify_arg};
use itertools::{EitherOrBoth, Itertools};

use crate::{
    decoded::DecodedSet,
    runs::{difference_runs, intersect_runs, union_runs},
};

/// Members of `a` or `b`.
pub fn union(a: &DecodedSet, b: &DecodedSet) -> Result<DecodedSet> {
    combine(a, b, (true, true), |x, y| union_runs(x, y).collect())
}

/// Members of both `a` and `b`.
pub fn intersection(a: &DecodedSet, b: &DecodedSet) -> Result<DecodedSet> {
    combine(a, b, (false, false), |x, y| intersect_runs(x, y).collect())
}

/// Members of `a` that are not members of `b`.
pub fn difference(a: &DecodedSet, b: &DecodedSet) -> Result<DecodedSet> {
    combine(a, b, (true, false), |x, y| difference_runs(x, y).collect())
}

impl DecodedSet {
    pub fn union(&self, other: &DecodedSet) -> Result<DecodedSet> {
        union(self, other)
    }

    pub fn intersection(&self, other: &DecodedSet) -> Result<DecodedSet> {
        intersection(self, other)
    }

    pub fn difference(&self, other: &DecodedSet) -> Result<DecodedSet> {
        difference(self, other)
    }
}

/// `keep` says whether partitions found only in `a` (first) or only in `b`
/// (second) belong to the result.
fn combine(
    a: &DecodedSet,
    b: &DecodedSet,
    keep: (bool, bool),
    merge: impl Fn(Vec<Range<u64>>, Vec<Range<u64>>) -> Vec<Range<u64>>,
) -> Result<DecodedSet> {
    verify_arg!(format, a.format().version == b.format().version);

    let mut out = DecodedSet::with_format(a.format(), a.limits());
    let pairs = a
        .partitions()
        .merge_join_by(b.partitions(), |x, y| x.id().cmp(&y.id()));
    for pair in pairs {
        let (id, runs) = match pair {
            EitherOrBoth::Both(x, y) => (x.id(), merge(x.runs(), y.runs())),
            EitherOrBoth::Left(x) if keep.0 => (x.id(), x.runs()),
            EitherOrBoth::Right(y) if keep.1 => (y.id(), y.runs()),
            _ => continue,
        };
        out.push_runs(id, &runs)?;
    }
    log::trace!(
        "combined {} and {} partitions into {}",
        a.partition_count(),
        b.partition_count(),
        out.partition_count()
    );
    Ok(out)
}
