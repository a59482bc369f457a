//! High-level API for model-matrix construction.
//!
//! ## Purpose
//!
//! This module provides the user-facing entry point: a fluent builder that
//! turns model descriptions and a chunk source into reusable [`ModelSpec`]s,
//! and the model spec itself, which builds left- and right-hand-side matrices for
//! any data with the same column layout and categorical coding every time.
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with sensible defaults for all parameters.
//! * **Validated**: Parameters set twice are rejected when `.build()` runs.
//! * **Reusable**: A spec is built once, then applied to training data and
//!   later to new data for scoring.
//! * **Type-Safe**: Generic over `Float` types for flexible precision.
//!
//! ## Key concepts
//!
//! * **Chunk sources**: Batch, Streaming, ChunkList, or any closure returning
//!   an iterator of chunks.
//! * **Incremental building**: One matrix pair per chunk, or a stacked pair.
//!
//! ### Configuration Flow
//!
//! 1. Create a [`ModelSpecBuilder`] via `ModelSpecBuilder::new()`.
//! 2. Optionally chain `.stateful_transforms()` and `.default_env()`.
//! 3. Call `.build(&descs, &source)` to run memorization and type examination.

// External dependencies
use log::debug;
use nalgebra::DMatrix;

// Internal dependencies
use crate::engine::builder::ModelMatrixBuilder;
use crate::engine::executor::ModelExecutor;
use crate::engine::validator::Validator;
use crate::math::scalar::ModelFloat;

// Publicly re-exported types
pub use crate::adapters::batch::Batch;
pub use crate::adapters::streaming::{ChunkList, Streaming};
pub use crate::algorithms::factor::{
    Factor, FactorRef, LookupFactor, ModelDesc, Term, TransformFactor,
};
pub use crate::algorithms::state::{FactorState, StateEntry};
pub use crate::algorithms::transforms::{StatefulTransform, TransformRegistry};
pub use crate::engine::column_info::ColumnInfo;
pub use crate::math::contrast::{Contrast, ContrastMatrix};
pub use crate::primitives::categorical::Categorical;
pub use crate::primitives::chunk::{Chunk, ChunkSource, EvalEnv};
pub use crate::primitives::errors::ModelError;
pub use crate::primitives::value::{Level, RawArray, Value};

/// Chunk source adapters.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::{Batch, ChunkList, Streaming};
}

// ============================================================================
// Builder
// ============================================================================

/// Fluent builder for constructing model specs.
#[derive(Debug, Clone)]
pub struct ModelSpecBuilder<T: ModelFloat> {
    /// Stateful transforms factors may request (default: `center`, `standardize`).
    pub stateful_transforms: Option<TransformRegistry<T>>,

    /// Bindings used when a chunk lacks a name.
    pub default_env: Option<Chunk<T>>,

    /// Tracks if any parameter was set multiple times (for validation).
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: ModelFloat> Default for ModelSpecBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ModelFloat> ModelSpecBuilder<T> {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            stateful_transforms: None,
            default_env: None,
            duplicate_param: None,
        }
    }

    /// Set the stateful transform registry.
    pub fn stateful_transforms(mut self, registry: TransformRegistry<T>) -> Self {
        if self.stateful_transforms.is_some() {
            self.duplicate_param = Some("stateful_transforms");
        }
        self.stateful_transforms = Some(registry);
        self
    }

    /// Set the default bindings.
    pub fn default_env(mut self, defaults: Chunk<T>) -> Self {
        if self.default_env.is_some() {
            self.duplicate_param = Some("default_env");
        }
        self.default_env = Some(defaults);
        self
    }

    /// Build one spec per description from the data in `source`.
    ///
    /// Factors shared between descriptions are memorized and classified once.
    pub fn build<S>(self, descs: &[ModelDesc<T>], source: &S) -> Result<Vec<ModelSpec<T>>, ModelError>
    where
        S: ChunkSource<T> + ?Sized,
    {
        Validator::validate_no_duplicates(self.duplicate_param)?;

        let mut executor = ModelExecutor::new();
        if let Some(registry) = self.stateful_transforms {
            executor = executor.stateful_transforms(registry);
        }
        if let Some(defaults) = self.default_env {
            executor = executor.default_env(defaults);
        }

        let output = executor.run(descs, source)?;
        let specs: Vec<ModelSpec<T>> = output
            .builders
            .into_iter()
            .map(|(lhs, rhs)| ModelSpec::new(lhs, rhs))
            .collect();
        for spec in &specs {
            debug!(
                "model spec ready: {} lhs column(s), {} rhs column(s)",
                spec.lhs_column_info().n_columns(),
                spec.rhs_column_info().n_columns()
            );
        }
        Ok(specs)
    }

    /// Build the model spec for a single description.
    pub fn build_one<S>(self, desc: &ModelDesc<T>, source: &S) -> Result<ModelSpec<T>, ModelError>
    where
        S: ChunkSource<T> + ?Sized,
    {
        self.build(std::slice::from_ref(desc), source)?
            .pop()
            .ok_or_else(|| ModelError::InvalidInput("no model spec was built".to_string()))
    }
}

// ============================================================================
// Model Spec
// ============================================================================

/// Left- and right-hand-side matrices for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMatrices<T: ModelFloat> {
    /// Left-hand-side matrix.
    pub lhs: DMatrix<T>,

    /// Right-hand-side matrix.
    pub rhs: DMatrix<T>,
}

impl<T: ModelFloat> ModelMatrices<T> {
    /// Concatenate matrix pairs by rows.
    ///
    /// All parts must agree on each side's column count.
    pub fn stack(parts: &[ModelMatrices<T>]) -> Result<Self, ModelError> {
        let lhs: Vec<&DMatrix<T>> = parts.iter().map(|p| &p.lhs).collect();
        let rhs: Vec<&DMatrix<T>> = parts.iter().map(|p| &p.rhs).collect();
        Ok(Self {
            lhs: stack_rows(&lhs)?,
            rhs: stack_rows(&rhs)?,
        })
    }

    /// Number of rows (shared by both sides).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rhs.nrows()
    }
}

fn stack_rows<T: ModelFloat>(parts: &[&DMatrix<T>]) -> Result<DMatrix<T>, ModelError> {
    let ncols = parts.first().map_or(0, |m| m.ncols());
    if let Some(bad) = parts.iter().find(|m| m.ncols() != ncols) {
        return Err(ModelError::OutputWidthMismatch {
            expected: ncols,
            found: bad.ncols(),
        });
    }
    let nrows = parts.iter().map(|m| m.nrows()).sum();
    let mut out = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for part in parts {
        out.rows_mut(offset, part.nrows()).copy_from(*part);
        offset += part.nrows();
    }
    Ok(out)
}

/// A reusable pair of model-matrix builders.
#[derive(Debug, Clone)]
pub struct ModelSpec<T: ModelFloat> {
    lhs: ModelMatrixBuilder<T>,
    rhs: ModelMatrixBuilder<T>,
}

impl<T: ModelFloat> ModelSpec<T> {
    /// Pair two builders.
    pub fn new(lhs: ModelMatrixBuilder<T>, rhs: ModelMatrixBuilder<T>) -> Self {
        Self { lhs, rhs }
    }

    /// Left-hand-side builder.
    #[inline]
    pub fn lhs_builder(&self) -> &ModelMatrixBuilder<T> {
        &self.lhs
    }

    /// Right-hand-side builder.
    #[inline]
    pub fn rhs_builder(&self) -> &ModelMatrixBuilder<T> {
        &self.rhs
    }

    /// Left-hand-side column layout.
    #[inline]
    pub fn lhs_column_info(&self) -> &ColumnInfo {
        self.lhs.column_info()
    }

    /// Right-hand-side column layout.
    #[inline]
    pub fn rhs_column_info(&self) -> &ColumnInfo {
        self.rhs.column_info()
    }

    /// Build both matrices for one in-memory chunk.
    pub fn make_matrices(&self, data: &Chunk<T>) -> Result<ModelMatrices<T>, ModelError> {
        self.make_matrices_incremental(&Batch::new(data.clone()))?
            .pop()
            .ok_or_else(|| ModelError::InvalidInput("batch source yielded no chunk".to_string()))
    }

    /// Build one matrix pair per chunk of `source`.
    pub fn make_matrices_incremental<S>(&self, source: &S) -> Result<Vec<ModelMatrices<T>>, ModelError>
    where
        S: ChunkSource<T> + ?Sized,
    {
        source
            .chunks()
            .map(|chunk| {
                Ok(ModelMatrices {
                    lhs: self.lhs.build(&chunk)?,
                    rhs: self.rhs.build(&chunk)?,
                })
            })
            .collect()
    }

    /// Build all chunks of `source` and stack them into one matrix pair.
    pub fn make_matrices_stacked<S>(&self, source: &S) -> Result<ModelMatrices<T>, ModelError>
    where
        S: ChunkSource<T> + ?Sized,
    {
        let parts = self.make_matrices_incremental(source)?;
        if parts.is_empty() {
            return Ok(ModelMatrices {
                lhs: DMatrix::zeros(0, self.lhs.n_columns()),
                rhs: DMatrix::zeros(0, self.rhs.n_columns()),
            });
        }
        ModelMatrices::stack(&parts)
    }
}
