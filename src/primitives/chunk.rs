//! Data chunks, evaluation environments and restartable chunk sources.
//!
//! ## Purpose
//!
//! This module defines the unit of streamed data ([`Chunk`]), the layered
//! lookup a factor evaluates against ([`EvalEnv`]), and the restartable
//! "factory of iterators" every phase of the pipeline consumes ([`ChunkSource`]).
//!
//! ## Design notes
//!
//! * **Restartable**: A `ChunkSource` is asked for a fresh iterator each time a
//!   phase needs a full pass, so memorization, examination and building can
//!   each re-traverse the data independently.
//! * **Layered lookup**: `EvalEnv` resolves a name in the chunk first, then in
//!   the default bindings.
//! * **Closures**: Any `Fn() -> impl IntoIterator<Item = Chunk<T>>` is a source.
//!
//! ## Invariants
//!
//! * Calling `chunks()` repeatedly yields the same chunk sequence.
//!
//! ## Non-goals
//!
//! * This module does not load data from files or other I/O.

// External dependencies
use std::collections::BTreeMap;

// Internal dependencies
use crate::primitives::errors::ModelError;
use crate::primitives::value::Value;

// ============================================================================
// Chunk
// ============================================================================

/// One chunk of tabular data: a mapping from name to column-like value.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<T> {
    columns: BTreeMap<String, Value<T>>,
}

impl<T> Default for Chunk<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Chunk<T> {
    /// Create an empty chunk.
    pub fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Add a binding and return the chunk (builder style).
    pub fn with(mut self, name: impl Into<String>, value: Value<T>) -> Self {
        self.columns.insert(name.into(), value);
        self
    }

    /// Add or replace a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Value<T>) -> Option<Value<T>> {
        self.columns.insert(name.into(), value)
    }

    /// Look up a binding.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value<T>> {
        self.columns.get(name)
    }

    /// Bound names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of bindings.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the chunk has no bindings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of rows: the leading dimension of the first non-scalar binding.
    pub fn nrows(&self) -> Option<usize> {
        self.columns
            .values()
            .find(|v| v.ndim() > 0)
            .map(|v| v.shape()[0])
    }
}

impl<T: Clone> Chunk<T> {
    /// Copy rows `start..end` of every binding.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v.slice_rows(start, end)))
                .collect(),
        }
    }
}

impl<T, K: Into<String>> FromIterator<(K, Value<T>)> for Chunk<T> {
    fn from_iter<I: IntoIterator<Item = (K, Value<T>)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ============================================================================
// Evaluation Environment
// ============================================================================

/// Layered name lookup: chunk bindings shadow default bindings.
#[derive(Debug, Clone, Copy)]
pub struct EvalEnv<'a, T> {
    chunk: &'a Chunk<T>,
    defaults: &'a Chunk<T>,
}

impl<'a, T> EvalEnv<'a, T> {
    /// Merge a chunk with the default bindings.
    pub fn new(chunk: &'a Chunk<T>, defaults: &'a Chunk<T>) -> Self {
        Self { chunk, defaults }
    }

    /// Look up a name, chunk first.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&'a Value<T>> {
        self.chunk.get(name).or_else(|| self.defaults.get(name))
    }

    /// Look up a name, failing with [`ModelError::UnknownVariable`].
    pub fn lookup(&self, name: &str) -> Result<&'a Value<T>, ModelError> {
        self.get(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    /// The chunk layer.
    #[inline]
    pub fn chunk(&self) -> &'a Chunk<T> {
        self.chunk
    }
}

// ============================================================================
// Chunk Source
// ============================================================================

/// A restartable stream of chunks.
///
/// Every call to [`chunks`](ChunkSource::chunks) must produce the same
/// sequence: memorization may need several full passes and examination needs
/// a pass of its own before any matrix is built.
pub trait ChunkSource<T> {
    /// Iterator over one full pass of the data.
    type Iter<'a>: Iterator<Item = Chunk<T>>
    where
        Self: 'a;

    /// Start a new pass over the data.
    fn chunks(&self) -> Self::Iter<'_>;
}

impl<T, F, I> ChunkSource<T> for F
where
    F: Fn() -> I,
    I: IntoIterator<Item = Chunk<T>>,
{
    type Iter<'a>
        = I::IntoIter
    where
        Self: 'a;

    fn chunks(&self) -> Self::Iter<'_> {
        self().into_iter()
    }
}
