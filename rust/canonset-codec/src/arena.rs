//! Index-addressed storage for segments and chunks.
//!
//! Partitions refer to their segments, and segments to their chunks, through
//! [`Span`]s: `(start, len)` index pairs into an owning [`Arena`]. Spans stay valid
//! when the arena reallocates, and every dereference is bounds-checked.

use std::{fmt, marker::PhantomData, ops::Range};

use canonset_common::{Result, error::Error};

/// Typed index range into an [`Arena<T>`].
pub struct Span<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Span<T> {
    pub const EMPTY: Span<T> = Span {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn range(&self) -> Range<usize> {
        self.start as usize..self.start as usize + self.len as usize
    }
}

impl<T> Clone for Span<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Span<T> {}

impl<T> PartialEq for Span<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len
    }
}

impl<T> Eq for Span<T> {}

impl<T> fmt::Debug for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..+{})", self.start, self.len)
    }
}

/// Append-only vector addressed by [`Span`]s.
///
/// Entries are never removed individually; callers that replace a span leave the
/// old entries behind as garbage and rebuild the arena when it grows too sparse.
#[derive(Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    /// Largest number of entries an arena can hold.
    pub const MAX_LEN: usize = u32::MAX as usize;

    pub fn new() -> Arena<T> {
        Arena { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Arena<T> {
        Arena {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `items` and returns their span.
    ///
    /// Fails with a capacity error, leaving the arena unchanged, if the arena would
    /// outgrow its `u32` index space.
    pub fn alloc(&mut self, items: impl IntoIterator<Item = T>) -> Result<Span<T>> {
        let start = self.items.len();
        self.items.extend(items);
        let end = self.items.len();
        if end > Self::MAX_LEN {
            self.items.truncate(start);
            return Err(Error::capacity("arena entries", Self::MAX_LEN as u64));
        }
        Ok(Span {
            start: start as u32,
            len: (end - start) as u32,
            _marker: PhantomData,
        })
    }

    /// Returns the entries of `span`, or `None` if it does not belong to this arena.
    pub fn get(&self, span: Span<T>) -> Option<&[T]> {
        self.items.get(span.range())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<T> std::ops::Index<Span<T>> for Arena<T> {
    type Output = [T];

    /// # Panics
    ///
    /// Panics if `span` is out of bounds for this arena.
    fn index(&self, span: Span<T>) -> &[T] {
        &self.items[span.range()]
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}
