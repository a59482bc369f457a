//! # charlton — streaming model-matrix construction for Rust
//!
//! Builds design ("model") matrices from symbolic model descriptions over
//! data that may arrive in chunks and may not fit in memory, with stable
//! column names and categorical coding that stays identical between
//! training and scoring.
//!
//! ## What is a model matrix?
//!
//! A statistical model such as `y ~ 1 + group + age:group` describes its
//! predictors as *terms*, each an interaction of *factors*. The model matrix
//! has one row per observation and one column per coded predictor:
//!
//! - Numeric factors contribute their values (one or more columns).
//! - Categorical factors contribute contrast-coded indicator columns.
//! - An interaction term contributes the row-wise product of every
//!   combination of its factors' columns.
//! - The empty term is the intercept, a column of ones.
//!
//! **How construction works:**
//!
//! 1. **Memorize**: stateful factors (e.g. `center(x)`) see the full data
//!    stream, possibly several times, to learn their statistics.
//! 2. **Examine**: every factor is classified as numeric (with a column
//!    count) or categorical (with a frozen level set), reading only as many
//!    chunks as needed.
//! 3. **Build**: per-term column builders expand each chunk into matrix
//!    columns, choosing full or reduced contrasts so the matrix is full rank.
//!
//! ## Quick Start
//!
//! ```rust
//! use charlton::prelude::*;
//!
//! let data: Chunk<f64> = Chunk::new()
//!     .with("y", Value::numeric(vec![1.0, 2.0, 3.0, 4.0]))
//!     .with("x", Value::numeric(vec![0.5, 1.5, 2.5, 3.5]))
//!     .with("g", Value::labels(["a", "b", "a", "c"]));
//!
//! let y = LookupFactor::shared("y");
//! let x = LookupFactor::shared("x");
//! let g = LookupFactor::shared("g");
//!
//! // y ~ 1 + g + x
//! let desc = ModelDesc::new(
//!     vec![Term::new(vec![y])],
//!     vec![Term::intercept(), Term::new(vec![g]), Term::new(vec![x])],
//! );
//!
//! let spec = ModelSpecBuilder::new().build_one(&desc, &Batch::new(data.clone()))?;
//! assert_eq!(
//!     spec.rhs_column_info().column_names(),
//!     &["Intercept", "g[T.b]", "g[T.c]", "x"]
//! );
//!
//! let matrices = spec.make_matrices(&data)?;
//! assert_eq!(matrices.rhs.nrows(), 4);
//! assert_eq!(matrices.lhs.ncols(), 1);
//! # Result::<(), ModelError>::Ok(())
//! ```
//!
//! ### Streaming
//!
//! Any restartable chunk source works. [`Streaming`](prelude::Streaming)
//! presents an in-memory chunk as row windows; a closure returning an
//! iterator of chunks is also a source.
//!
//! ```rust
//! use charlton::prelude::*;
//!
//! let data: Chunk<f64> = Chunk::new()
//!     .with("x", Value::numeric(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
//!     .with("flag", Value::boolean(vec![true, false, false, true, true]));
//!
//! let x = TransformFactor::shared("standardize", "x");
//! let flag = LookupFactor::shared("flag");
//! let desc = ModelDesc::new(
//!     vec![],
//!     vec![Term::intercept(), Term::new(vec![flag]), Term::new(vec![x])],
//! );
//!
//! let source = Streaming::new(data.clone(), 2)?;
//! let spec = ModelSpecBuilder::new().build_one(&desc, &source)?;
//! assert_eq!(
//!     spec.rhs_column_info().column_names(),
//!     &["Intercept", "flag[T.true]", "standardize(x)"]
//! );
//!
//! // One matrix pair per window, or everything stacked.
//! assert_eq!(spec.make_matrices_incremental(&source)?.len(), 3);
//! let stacked = spec.make_matrices_stacked(&source)?;
//! assert_eq!(stacked.rhs, spec.make_matrices(&data)?.rhs);
//! # Result::<(), ModelError>::Ok(())
//! ```
//!
//! ### Result and Error Handling
//!
//! Every fallible operation returns `Result<_, ModelError>`. Errors name the
//! offending factor; no partial matrix is ever returned.
//!
//! ```rust
//! use charlton::prelude::*;
//!
//! let train: Chunk<f64> = Chunk::new().with("g", Value::labels(["a", "b"]));
//! let g = LookupFactor::shared("g");
//! let desc = ModelDesc::new(vec![], vec![Term::intercept(), Term::new(vec![g])]);
//! let spec = ModelSpecBuilder::new().build_one(&desc, &Batch::new(train))?;
//!
//! let unseen: Chunk<f64> = Chunk::new().with("g", Value::labels(["c"]));
//! match spec.make_matrices(&unseen) {
//!     Err(ModelError::LevelMismatch { factor, .. }) => assert_eq!(factor, "g"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! # Result::<(), ModelError>::Ok(())
//! ```

#![deny(missing_docs)]

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - data structures.
//
// Contains the error type, evaluated values and levels, categorical data,
// chunks and chunk sources.
mod primitives;

// Layer 2: Math - pure numeric building blocks.
//
// Contains the float bound, odometer enumeration and contrast coding.
mod math;

// Layer 3: Algorithms - model-building logic.
//
// Contains factor state, stateful transforms, the factor protocol, level
// discovery, full-rank contrast selection and the column builder.
mod algorithms;

// Layer 4: Engine - orchestration.
//
// Contains memorization, type examination, evaluators, the model matrix
// builder and the executor.
mod engine;

// Layer 5: Adapters - chunk sources.
//
// Contains batch (single chunk) and streaming (row windows, chunk lists)
// sources.
mod adapters;

// High-level fluent API.
//
// Provides `ModelSpecBuilder` and `ModelSpec`.
mod api;

// ============================================================================
// Prelude
// ============================================================================

/// Standard charlton prelude.
///
/// This module is intended to be wildcard-imported for convenient access
/// to the most commonly used types:
///
/// ```
/// use charlton::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{
        Adapter::{Batch, ChunkList, Streaming},
        Categorical, Chunk, ChunkSource, ColumnInfo, Contrast, ContrastMatrix, EvalEnv, Factor,
        FactorRef, FactorState, Level, LookupFactor, ModelDesc, ModelError, ModelMatrices,
        ModelSpec, ModelSpecBuilder, RawArray, StateEntry, StatefulTransform, Term,
        TransformFactor, TransformRegistry, Value,
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// **Warning**: These are internal implementation details and may change without notice.
/// Do not use in production code.
#[doc(hidden)]
pub mod internals {
    /// Internal primitive types.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Internal math functions.
    pub mod math {
        pub use crate::math::*;
    }
    /// Internal model-building algorithms.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Internal execution engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// Internal adapters.
    pub mod adapters {
        pub use crate::adapters::*;
    }
    /// Internal API.
    pub mod api {
        pub use crate::api::*;
    }
}
