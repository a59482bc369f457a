//! Stateful transforms and their registry.
//!
//! ## Purpose
//!
//! This module provides transforms whose output depends on statistics of the
//! *whole* data stream, such as centering or standardizing a variable. They
//! are the reason factors need memorization passes: the statistics are
//! gathered chunk by chunk before any value can be transformed.
//!
//! ## Design notes
//!
//! * **Multi-pass**: Each transform declares how many full passes it needs.
//!   `standardize` needs two (mean, then spread around that mean).
//! * **Column-wise**: Statistics are kept per column of the column-default
//!   two-dimensional view, so matrix-valued variables work too.
//! * **Registry**: Factors look transforms up by name and store a fresh
//!   instance in their own state.
//! * **Generics**: Generic over `Float` types.
//!
//! ## Invariants
//!
//! * A transform is only applied after its final pass has finished.
//! * The column count seen on the first chunk is fixed for later chunks.
//!
//! ## Non-goals
//!
//! * This module does not decide when passes start or end (see `engine::memorize`).

// External dependencies
use core::fmt::Debug;
use std::collections::BTreeMap;

// Internal dependencies
use crate::math::scalar::ModelFloat;
use crate::primitives::errors::ModelError;
use crate::primitives::value::RawArray;

// ============================================================================
// Stateful Transform
// ============================================================================

/// A transform that must see the data stream before it can be applied.
pub trait StatefulTransform<T>: Debug {
    /// Number of full passes over the data required before `transform` works.
    fn passes_needed(&self) -> usize;

    /// Accumulate statistics from one chunk during pass `which_pass`.
    fn memorize_chunk(&mut self, which_pass: usize, values: &RawArray<T>) -> Result<(), ModelError>;

    /// Close pass `which_pass`.
    fn memorize_finish(&mut self, which_pass: usize) -> Result<(), ModelError>;

    /// Apply the memorized transform to one chunk.
    fn transform(&self, values: &RawArray<T>) -> Result<RawArray<T>, ModelError>;
}

/// Constructor stored in a [`TransformRegistry`].
pub type TransformCtor<T> = fn() -> Box<dyn StatefulTransform<T>>;

// ============================================================================
// Column Accumulation
// ============================================================================

/// Running per-column sums over a stream of chunks.
#[derive(Debug, Clone, Default)]
struct ColumnSums<T> {
    sums: Vec<T>,
    count: usize,
}

impl<T: ModelFloat> ColumnSums<T> {
    fn add<F: Fn(usize, T) -> T>(&mut self, values: &RawArray<T>, f: F) -> Result<(), ModelError> {
        let ncols = checked_columns(values)?;
        if self.sums.is_empty() && self.count == 0 {
            self.sums = vec![T::zero(); ncols];
        } else if self.sums.len() != ncols {
            return Err(ModelError::InvalidInput(format!(
                "stateful transform saw {} columns, then {}",
                self.sums.len(),
                ncols
            )));
        }
        if ncols == 0 {
            return Ok(());
        }
        for (i, &v) in values.data().iter().enumerate() {
            let col = i % ncols;
            self.sums[col] = self.sums[col] + f(col, v);
        }
        self.count += values.len() / ncols;
        Ok(())
    }

    fn means(&self) -> Vec<T> {
        let n = T::from_f64_lossy(self.count as f64);
        self.sums.iter().map(|&s| s / n).collect()
    }
}

fn checked_columns<T>(values: &RawArray<T>) -> Result<usize, ModelError> {
    if values.ndim() > 2 {
        return Err(ModelError::InvalidInput(format!(
            "stateful transforms accept at most 2 dimensions, got {}",
            values.ndim()
        )));
    }
    Ok(values.shape_2d().1)
}

fn not_memorized(name: &str) -> ModelError {
    ModelError::InvalidInput(format!("{} applied before memorization finished", name))
}

// ============================================================================
// Center
// ============================================================================

/// Subtract the per-column mean of the full data stream (one pass).
#[derive(Debug, Clone, Default)]
pub struct Center<T> {
    sums: ColumnSums<T>,
    means: Option<Vec<T>>,
}

impl<T: ModelFloat> Center<T> {
    /// Create an unmemorized transform.
    pub fn new() -> Self {
        Self {
            sums: ColumnSums {
                sums: Vec::new(),
                count: 0,
            },
            means: None,
        }
    }

    /// Memorized means, once the pass is finished.
    pub fn means(&self) -> Option<&[T]> {
        self.means.as_deref()
    }
}

impl<T: ModelFloat> StatefulTransform<T> for Center<T> {
    fn passes_needed(&self) -> usize {
        1
    }

    fn memorize_chunk(&mut self, _which_pass: usize, values: &RawArray<T>) -> Result<(), ModelError> {
        self.sums.add(values, |_, v| v)
    }

    fn memorize_finish(&mut self, _which_pass: usize) -> Result<(), ModelError> {
        self.means = Some(self.sums.means());
        Ok(())
    }

    fn transform(&self, values: &RawArray<T>) -> Result<RawArray<T>, ModelError> {
        let means = self.means.as_ref().ok_or_else(|| not_memorized("center"))?;
        apply_columnwise(values, means.len(), |col, v| v - means[col])
    }
}

// ============================================================================
// Standardize
// ============================================================================

/// Center and scale each column to unit population standard deviation (two passes).
///
/// A column with zero spread is only centered.
#[derive(Debug, Clone, Default)]
pub struct Standardize<T> {
    sums: ColumnSums<T>,
    squares: ColumnSums<T>,
    means: Option<Vec<T>>,
    scales: Option<Vec<T>>,
}

impl<T: ModelFloat> Standardize<T> {
    /// Create an unmemorized transform.
    pub fn new() -> Self {
        Self {
            sums: ColumnSums {
                sums: Vec::new(),
                count: 0,
            },
            squares: ColumnSums {
                sums: Vec::new(),
                count: 0,
            },
            means: None,
            scales: None,
        }
    }
}

impl<T: ModelFloat> StatefulTransform<T> for Standardize<T> {
    fn passes_needed(&self) -> usize {
        2
    }

    fn memorize_chunk(&mut self, which_pass: usize, values: &RawArray<T>) -> Result<(), ModelError> {
        match which_pass {
            0 => self.sums.add(values, |_, v| v),
            _ => {
                let means = self.means.as_ref().ok_or_else(|| not_memorized("standardize"))?;
                self.squares.add(values, |col, v| {
                    let d = v - means[col];
                    d * d
                })
            }
        }
    }

    fn memorize_finish(&mut self, which_pass: usize) -> Result<(), ModelError> {
        match which_pass {
            0 => self.means = Some(self.sums.means()),
            _ => {
                self.scales = Some(self.squares.means().into_iter().map(T::sqrt).collect());
            }
        }
        Ok(())
    }

    fn transform(&self, values: &RawArray<T>) -> Result<RawArray<T>, ModelError> {
        let (means, scales) = match (&self.means, &self.scales) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(not_memorized("standardize")),
        };
        apply_columnwise(values, means.len(), |col, v| {
            let centered = v - means[col];
            if scales[col] > T::zero() {
                centered / scales[col]
            } else {
                centered
            }
        })
    }
}

fn apply_columnwise<T: ModelFloat, F: Fn(usize, T) -> T>(
    values: &RawArray<T>,
    expected_columns: usize,
    f: F,
) -> Result<RawArray<T>, ModelError> {
    let ncols = checked_columns(values)?;
    if ncols != expected_columns {
        return Err(ModelError::InvalidInput(format!(
            "stateful transform memorized {} columns, got {}",
            expected_columns, ncols
        )));
    }
    let data = values
        .data()
        .iter()
        .enumerate()
        .map(|(i, &v)| f(i % ncols.max(1), v))
        .collect();
    RawArray::from_shape_vec(values.shape().to_vec(), data)
}

// ============================================================================
// Registry
// ============================================================================

fn make_center<T: ModelFloat>() -> Box<dyn StatefulTransform<T>> {
    Box::new(Center::new())
}

fn make_standardize<T: ModelFloat>() -> Box<dyn StatefulTransform<T>> {
    Box::new(Standardize::new())
}

/// Name → constructor mapping for stateful transforms.
#[derive(Debug, Clone)]
pub struct TransformRegistry<T> {
    ctors: BTreeMap<String, TransformCtor<T>>,
}

impl<T: ModelFloat> Default for TransformRegistry<T> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<T: ModelFloat> TransformRegistry<T> {
    /// Registry with no transforms.
    pub fn empty() -> Self {
        Self {
            ctors: BTreeMap::new(),
        }
    }

    /// Registry with `center` and `standardize`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("center", make_center::<T>);
        registry.register("standardize", make_standardize::<T>);
        registry
    }

    /// Register (or replace) a transform constructor.
    pub fn register(&mut self, name: impl Into<String>, ctor: TransformCtor<T>) {
        self.ctors.insert(name.into(), ctor);
    }

    /// Whether a transform is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Create a fresh instance of a registered transform.
    pub fn create(&self, name: &str) -> Result<Box<dyn StatefulTransform<T>>, ModelError> {
        self.ctors
            .get(name)
            .map(|ctor| ctor())
            .ok_or_else(|| ModelError::UnknownTransform(name.to_string()))
    }
}
