//! Batch adapter: one in-memory chunk.
//!
//! ## Purpose
//!
//! This module provides the chunk source for data that fits in memory as a
//! single chunk. Every pass yields that chunk once.
//!
//! ## Non-goals
//!
//! * This adapter does not split data (see `adapters::streaming`).

// External dependencies
use std::iter;

// Internal dependencies
use crate::primitives::chunk::{Chunk, ChunkSource};

/// A chunk source yielding one chunk per pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    chunk: Chunk<T>,
}

impl<T> Batch<T> {
    /// Wrap a chunk.
    pub fn new(chunk: Chunk<T>) -> Self {
        Self { chunk }
    }

    /// The wrapped chunk.
    #[inline]
    pub fn chunk(&self) -> &Chunk<T> {
        &self.chunk
    }

    /// Unwrap the chunk.
    pub fn into_inner(self) -> Chunk<T> {
        self.chunk
    }
}

impl<T> From<Chunk<T>> for Batch<T> {
    fn from(chunk: Chunk<T>) -> Self {
        Self::new(chunk)
    }
}

impl<T: Clone> ChunkSource<T> for Batch<T> {
    type Iter<'a>
        = iter::Once<Chunk<T>>
    where
        Self: 'a;

    fn chunks(&self) -> Self::Iter<'_> {
        iter::once(self.chunk.clone())
    }
}
