//! Interface shared by the set representations.

use canonset_common::Result;

use crate::{decoded::DecodedSet, trivial::WordSet};

/// A set of 64-bit identifiers with a canonical byte encoding.
///
/// Implemented by the hierarchical [`DecodedSet`] and by the single-word
/// [`WordSet`], which covers identifiers `0..64` only.
pub trait IdSet: Sized {
    fn from_ids(ids: impl IntoIterator<Item = u64>) -> Result<Self>;

    fn encode(&self) -> Result<Vec<u8>>;

    fn decode(bytes: &[u8]) -> Result<Self>;

    fn contains(&self, id: u64) -> bool;

    /// Adds `id`; returns `false` if it was already present.
    fn insert(&mut self, id: u64) -> Result<bool>;

    /// Removes `id`; returns `false` if it was absent.
    fn remove(&mut self, id: u64) -> Result<bool>;

    fn cardinality(&self) -> u64;

    /// Number of members strictly below `id`.
    fn rank(&self, id: u64) -> u64;

    /// Members in ascending order.
    fn ids(&self) -> impl Iterator<Item = u64> + '_;

    fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }
}

impl IdSet for DecodedSet {
    fn from_ids(ids: impl IntoIterator<Item = u64>) -> Result<Self> {
        DecodedSet::from_ids(ids)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        DecodedSet::encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        DecodedSet::decode(bytes)
    }

    fn contains(&self, id: u64) -> bool {
        DecodedSet::contains(self, id)
    }

    fn insert(&mut self, id: u64) -> Result<bool> {
        DecodedSet::insert(self, id)
    }

    fn remove(&mut self, id: u64) -> Result<bool> {
        DecodedSet::remove(self, id)
    }

    fn cardinality(&self) -> u64 {
        DecodedSet::cardinality(self)
    }

    fn rank(&self, id: u64) -> u64 {
        DecodedSet::rank(self, id)
    }

    fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        DecodedSet::ids(self)
    }

    fn is_empty(&self) -> bool {
        DecodedSet::is_empty(self)
    }
}

impl IdSet for WordSet {
    fn from_ids(ids: impl IntoIterator<Item = u64>) -> Result<Self> {
        WordSet::from_ids(ids)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        WordSet::encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        WordSet::decode(bytes)
    }

    fn contains(&self, id: u64) -> bool {
        WordSet::contains(self, id)
    }

    fn insert(&mut self, id: u64) -> Result<bool> {
        WordSet::insert(self, id)
    }

    fn remove(&mut self, id: u64) -> Result<bool> {
        WordSet::remove(self, id)
    }

    fn cardinality(&self) -> u64 {
        WordSet::cardinality(self)
    }

    fn rank(&self, id: u64) -> u64 {
        WordSet::rank(self, id)
    }

    fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        WordSet::ids(self)
    }

    fn is_empty(&self) -> bool {
        WordSet::is_empty(self)
    }
}
