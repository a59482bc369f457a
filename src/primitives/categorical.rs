//! Leveled categorical data.
//!
//! ## Purpose
//!
//! This module defines [`Categorical`], the value a factor returns when its
//! data is already leveled: an ordered level set, one integer code per row and
//! an optional contrast choice.
//!
//! ## Design notes
//!
//! * **Validated**: Constructors reject duplicate levels and out-of-range codes.
//! * **Frozen levels**: Level order is part of the value and is compared
//!   order-sensitively by the categorical evaluator.
//!
//! ## Invariants
//!
//! * `levels` contains no duplicates.
//! * Every code is `< levels.len()`.
//!
//! ## Non-goals
//!
//! * This module does not compute contrast matrices (see `math::contrast`).

// External dependencies
use std::collections::BTreeSet;

// Internal dependencies
use crate::math::contrast::Contrast;
use crate::primitives::errors::ModelError;
use crate::primitives::value::{Level, RawArray};

/// Categorical data: levels, per-row codes and an optional contrast.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    levels: Vec<Level>,
    codes: RawArray<usize>,
    contrast: Option<Contrast>,
}

impl Categorical {
    /// Create categorical data from codes and their levels.
    pub fn new(codes: RawArray<usize>, levels: Vec<Level>) -> Result<Self, ModelError> {
        let mut seen = BTreeSet::new();
        for level in &levels {
            if !seen.insert(level) {
                return Err(ModelError::InvalidInput(format!(
                    "duplicate categorical level '{}'",
                    level
                )));
            }
        }
        if let Some(&bad) = codes.data().iter().find(|&&c| c >= levels.len()) {
            return Err(ModelError::InvalidInput(format!(
                "categorical code {} out of range for {} levels",
                bad,
                levels.len()
            )));
        }
        Ok(Self {
            levels,
            codes,
            contrast: None,
        })
    }

    /// Create categorical data from labels, using the sorted distinct labels as levels.
    pub fn from_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let labels: Vec<Level> = labels.into_iter().map(Into::into).collect();
        let levels: Vec<Level> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes = labels
            .iter()
            .map(|l| levels.binary_search(l).unwrap_or_default())
            .collect();
        Self {
            levels,
            codes: RawArray::from_vec(codes),
            contrast: None,
        }
    }

    /// Create categorical data from labels with an explicit level order.
    pub fn from_labels_with_levels<I, L>(labels: I, levels: Vec<Level>) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let mut codes = Vec::new();
        for label in labels {
            let label = label.into();
            let code = levels.iter().position(|l| *l == label).ok_or_else(|| {
                ModelError::InvalidInput(format!("label '{}' is not one of the levels", label))
            })?;
            codes.push(code);
        }
        Self::new(RawArray::from_vec(codes), levels)
    }

    /// Attach a contrast to use when this data is coded.
    pub fn with_contrast(mut self, contrast: Contrast) -> Self {
        self.contrast = Some(contrast);
        self
    }

    /// Ordered levels.
    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Per-row level codes.
    #[inline]
    pub fn codes(&self) -> &RawArray<usize> {
        &self.codes
    }

    /// Contrast attached to this data, if any.
    #[inline]
    pub fn contrast(&self) -> Option<&Contrast> {
        self.contrast.as_ref()
    }

    /// Copy rows `start..end`, keeping levels and contrast.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            levels: self.levels.clone(),
            codes: self.codes.slice_rows(start, end),
            contrast: self.contrast.clone(),
        }
    }
}
