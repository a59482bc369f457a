//! Column layout metadata.
//!
//! ## Purpose
//!
//! This module defines [`ColumnInfo`], the description attached to every
//! model-matrix builder: the ordered column names and, for each term, the
//! contiguous half-open range of columns it occupies.
//!
//! ## Invariants
//!
//! * `column_names[i]` names matrix column `i`.
//! * Term spans are contiguous, non-overlapping, in term order, and cover
//!   `0..column_names.len()`.

// External dependencies
use core::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Names and term layout of a model matrix's columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnInfo {
    column_names: Vec<String>,
    term_names: Vec<String>,
    term_spans: Vec<Range<usize>>,
}

impl ColumnInfo {
    /// Lay out terms one after another.
    ///
    /// `terms` pairs each term name with its column names, in term order.
    pub fn from_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut info = Self::default();
        for (term, names) in terms {
            let start = info.column_names.len();
            info.column_names.extend(names);
            info.term_spans.push(start..info.column_names.len());
            info.term_names.push(term);
        }
        info
    }

    /// Column names, in column order.
    #[inline]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Term names, in term order.
    #[inline]
    pub fn term_names(&self) -> &[String] {
        &self.term_names
    }

    /// `(term name, column span)` pairs, in term order.
    pub fn term_spans(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.term_names
            .iter()
            .map(String::as_str)
            .zip(self.term_spans.iter().cloned())
    }

    /// Column span of a term.
    pub fn term_span(&self, term: &str) -> Option<Range<usize>> {
        self.term_names
            .iter()
            .position(|t| t == term)
            .map(|i| self.term_spans[i].clone())
    }

    /// Index of a named column.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == column)
    }

    /// Name of the term owning a column.
    pub fn term_for_column(&self, column: usize) -> Option<&str> {
        self.term_spans
            .iter()
            .position(|span| span.contains(&column))
            .map(|i| self.term_names[i].as_str())
    }
}
