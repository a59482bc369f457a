//! Streaming adapters: row windows and pre-split chunk lists.
//!
//! ## Purpose
//!
//! This module provides restartable chunk sources that present data as a
//! sequence of smaller chunks, so model specs can be built and applied with
//! bounded per-chunk memory.
//!
//! ## Design notes
//!
//! * **Row windows**: [`Streaming`] slices one in-memory chunk into windows of
//!   `chunk_size` rows; the last window may be shorter.
//! * **Chunk lists**: [`ChunkList`] replays caller-split chunks in order.
//! * **Restartable**: Both produce the identical sequence on every pass.
//!
//! ## Key concepts
//!
//! * **Scalar bindings**: Zero-dimensional values have no row axis and are
//!   repeated in every window.
//!
//! ## Invariants
//!
//! * `chunk_size >= 1`.
//! * Concatenating the windows in order gives back the original rows.
//!
//! ## Non-goals
//!
//! * This adapter does not read from files or sockets.

// External dependencies
use std::iter::Cloned;
use std::slice;

// Internal dependencies
use crate::engine::validator::Validator;
use crate::primitives::chunk::{Chunk, ChunkSource};
use crate::primitives::errors::ModelError;

// ============================================================================
// Row Windows
// ============================================================================

/// Presents one in-memory chunk as windows of `chunk_size` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Streaming<T> {
    chunk: Chunk<T>,
    chunk_size: usize,
}

impl<T> Streaming<T> {
    /// Split `chunk` into windows of `chunk_size` rows.
    pub fn new(chunk: Chunk<T>, chunk_size: usize) -> Result<Self, ModelError> {
        Validator::validate_chunk_size(chunk_size, 1)?;
        Ok(Self { chunk, chunk_size })
    }

    /// Rows per window.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of windows one pass yields.
    pub fn n_windows(&self) -> usize {
        match self.chunk.nrows() {
            Some(n) => n.div_ceil(self.chunk_size),
            None => 1,
        }
    }
}

/// Iterator over the row windows of a [`Streaming`] source.
#[derive(Debug, Clone)]
pub struct RowWindows<'a, T> {
    source: &'a Streaming<T>,
    start: usize,
    remaining: usize,
}

impl<T: Clone> Iterator for RowWindows<'_, T> {
    type Item = Chunk<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let end = self.start + self.source.chunk_size;
        let window = self.source.chunk.slice_rows(self.start, end);
        self.start = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Clone> ExactSizeIterator for RowWindows<'_, T> {}

impl<T: Clone> ChunkSource<T> for Streaming<T> {
    type Iter<'a>
        = RowWindows<'a, T>
    where
        Self: 'a;

    fn chunks(&self) -> Self::Iter<'_> {
        RowWindows {
            source: self,
            start: 0,
            remaining: self.n_windows(),
        }
    }
}

// ============================================================================
// Chunk List
// ============================================================================

/// Replays a fixed list of chunks on every pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChunkList<T> {
    chunks: Vec<Chunk<T>>,
}

impl<T> ChunkList<T> {
    /// Wrap pre-split chunks.
    pub fn new(chunks: Vec<Chunk<T>>) -> Self {
        Self { chunks }
    }

    /// Number of chunks.
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl<T> FromIterator<Chunk<T>> for ChunkList<T> {
    fn from_iter<I: IntoIterator<Item = Chunk<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: Clone> ChunkSource<T> for ChunkList<T> {
    type Iter<'a>
        = Cloned<slice::Iter<'a, Chunk<T>>>
    where
        Self: 'a;

    fn chunks(&self) -> Self::Iter<'_> {
        self.chunks.iter().cloned()
    }
}
