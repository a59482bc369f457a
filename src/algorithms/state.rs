//! Per-factor memorization state.
//!
//! ## Purpose
//!
//! This module defines [`FactorState`], the opaque keyed store each factor
//! owns for the lifetime of a build. The pipeline creates it empty, passes it
//! explicitly into every memorize and eval call, and never looks inside.
//!
//! ## Design notes
//!
//! * **Explicit handle**: State is an argument, not captured by the factor, so
//!   orchestration stays free of hidden coupling and mocks can inspect it.
//! * **Frozen after memorization**: The engine moves each state behind an
//!   `Arc` once memorization finishes; evaluation only reads it.
//!
//! ## Non-goals
//!
//! * This module does not interpret any entry.

// External dependencies
use std::collections::BTreeMap;

// Internal dependencies
use crate::algorithms::transforms::StatefulTransform;

/// One stored item in a factor's state.
#[derive(Debug)]
pub enum StateEntry<T> {
    /// A stateful transform instance.
    Transform(Box<dyn StatefulTransform<T>>),

    /// A counter.
    Count(usize),

    /// A text value.
    Text(String),
}

/// Opaque state owned by a single factor.
#[derive(Debug)]
pub struct FactorState<T> {
    entries: BTreeMap<String, StateEntry<T>>,
}

impl<T> Default for FactorState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FactorState<T> {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Store an entry, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, entry: StateEntry<T>) -> Option<StateEntry<T>> {
        self.entries.insert(key.into(), entry)
    }

    /// Read an entry.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&StateEntry<T>> {
        self.entries.get(key)
    }

    /// Mutate an entry.
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut StateEntry<T>> {
        self.entries.get_mut(key)
    }

    /// Whether the state holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Increment a counter entry (creating it at zero) and return the new value.
    pub fn bump(&mut self, key: &str) -> usize {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert(StateEntry::Count(0));
        match entry {
            StateEntry::Count(n) => {
                *n += 1;
                *n
            }
            other => {
                *other = StateEntry::Count(1);
                1
            }
        }
    }

    /// Value of a counter entry (zero when absent).
    pub fn count(&self, key: &str) -> usize {
        match self.entries.get(key) {
            Some(StateEntry::Count(n)) => *n,
            _ => 0,
        }
    }

    /// Borrow a stored transform.
    pub fn transform(&self, key: &str) -> Option<&dyn StatefulTransform<T>> {
        match self.entries.get(key) {
            Some(StateEntry::Transform(t)) => Some(t.as_ref()),
            _ => None,
        }
    }

    /// Mutably borrow a stored transform.
    pub fn transform_mut(&mut self, key: &str) -> Option<&mut (dyn StatefulTransform<T> + 'static)> {
        match self.entries.get_mut(key) {
            Some(StateEntry::Transform(t)) => Some(t.as_mut()),
            _ => None,
        }
    }
}
