//! Level discovery and categorical postprocessing.
//!
//! ## Purpose
//!
//! This module covers the two halves of treating raw values as categorical
//! data: discovering the level set of label-valued factors while streaming
//! (the [`LevelAccumulator`]), and converting each later evaluation into a
//! [`Categorical`] with the frozen levels (the [`Postprocessor`]).
//!
//! ## Design notes
//!
//! * **Sorted levels**: Discovered levels are the sorted distinct labels seen
//!   over the whole stream, so the result does not depend on chunking.
//! * **Booleans**: Boolean data never needs discovery; its levels are always
//!   `(false, true)`.
//!
//! ## Invariants
//!
//! * A postprocessor never adds levels; an unseen label is an error.
//!
//! ## Non-goals
//!
//! * This module does not pick contrasts (see `math::contrast`).

// External dependencies
use std::collections::BTreeSet;

// Internal dependencies
use crate::primitives::categorical::Categorical;
use crate::primitives::errors::ModelError;
use crate::primitives::value::{Level, RawArray, Value};

// ============================================================================
// Level Accumulator
// ============================================================================

/// Collects the distinct labels of one factor across chunks.
#[derive(Debug, Clone, Default)]
pub struct LevelAccumulator {
    levels: BTreeSet<Level>,
}

impl LevelAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the labels of one chunk.
    pub fn add(&mut self, labels: &RawArray<Level>) {
        self.levels.extend(labels.data().iter().cloned());
    }

    /// Number of distinct levels seen so far.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no label has been seen.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Freeze the sorted level sequence.
    pub fn finish(self) -> Vec<Level> {
        self.levels.into_iter().collect()
    }
}

// ============================================================================
// Postprocessor
// ============================================================================

/// Turns a raw evaluated value into categorical data with frozen levels.
#[derive(Debug, Clone, PartialEq)]
pub enum Postprocessor {
    /// Boolean arrays become categorical with levels `(false, true)`.
    BoolToCategorical,

    /// Label arrays are coded against these levels.
    Levels(Vec<Level>),
}

impl Postprocessor {
    /// Convert `value`, evaluated for `factor`, to categorical data.
    ///
    /// Values that are already categorical pass through unchanged.
    pub fn transform<T>(&self, factor: &str, value: Value<T>) -> Result<Categorical, ModelError> {
        match (self, value) {
            (_, Value::Categorical(c)) => Ok(c),
            (Postprocessor::BoolToCategorical, Value::Boolean(flags)) => {
                check_vector(factor, flags.ndim())?;
                let codes = flags.map(|&b| usize::from(b));
                Categorical::new(codes, vec![Level::Bool(false), Level::Bool(true)])
            }
            (Postprocessor::Levels(levels), Value::Labels(labels)) => {
                check_vector(factor, labels.ndim())?;
                code_labels(factor, levels, &labels)
            }
            (Postprocessor::BoolToCategorical, other) => Err(ModelError::TypeMismatch {
                factor: factor.to_string(),
                expected: "boolean",
                found: other.kind(),
            }),
            (Postprocessor::Levels(_), other) => Err(ModelError::TypeMismatch {
                factor: factor.to_string(),
                expected: "label",
                found: other.kind(),
            }),
        }
    }
}

fn check_vector(factor: &str, ndim: usize) -> Result<(), ModelError> {
    if ndim > 1 {
        return Err(ModelError::TooManyDimensions {
            factor: factor.to_string(),
            ndim,
            max: 1,
        });
    }
    Ok(())
}

fn code_labels(
    factor: &str,
    levels: &[Level],
    labels: &RawArray<Level>,
) -> Result<Categorical, ModelError> {
    let mut codes = Vec::with_capacity(labels.len());
    for label in labels.data() {
        match levels.iter().position(|l| l == label) {
            Some(code) => codes.push(code),
            None => {
                let mut found: BTreeSet<Level> = levels.iter().cloned().collect();
                found.extend(labels.data().iter().cloned());
                return Err(ModelError::LevelMismatch {
                    factor: factor.to_string(),
                    expected: levels.to_vec(),
                    found: found.into_iter().collect(),
                });
            }
        }
    }
    let codes = RawArray::from_shape_vec(labels.shape().to_vec(), codes)?;
    Categorical::new(codes, levels.to_vec())
}
