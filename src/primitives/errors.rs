//! Error types for model-matrix construction.
//!
//! ## Purpose
//!
//! This module defines [`ModelError`], the single error type returned by every
//! fallible operation in the crate: memorization, type examination, factor
//! evaluation, column building and spec configuration.
//!
//! ## Design notes
//!
//! * **Fatal**: Every error aborts the current call; there are no retries and no
//!   partial matrices.
//! * **Attributed**: Data-dependent errors carry the name of the factor that
//!   produced the offending value.
//! * **Comparable**: Errors are `Clone + PartialEq` so tests can match them exactly.
//!
//! ## Invariants
//!
//! * Display messages are stable and human-readable.
//!
//! ## Non-goals
//!
//! * This module does not decide *when* an error is raised (see `engine::validator`).

// External dependencies
use thiserror::Error;

// Internal dependencies
use crate::primitives::value::Level;

/// Error type for model-spec construction and model-matrix building.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A factor evaluated to an array with too many dimensions.
    #[error(
        "factor '{factor}' evaluates to a {ndim}-dimensional array; only arrays with dimension <= {max} are supported"
    )]
    TooManyDimensions {
        /// Offending factor.
        factor: String,
        /// Dimensionality of the evaluated value.
        ndim: usize,
        /// Maximum dimensionality allowed in this position.
        max: usize,
    },

    /// A factor evaluated to data of the wrong kind.
    #[error("factor '{factor}': expected {expected} data, got {found}")]
    TypeMismatch {
        /// Offending factor.
        factor: String,
        /// Kind of data that was required.
        expected: &'static str,
        /// Kind of data that was produced.
        found: &'static str,
    },

    /// A numeric factor changed its column count after type examination.
    #[error("factor '{factor}' produced {found} columns, expected {expected}")]
    ColumnCountMismatch {
        /// Offending factor.
        factor: String,
        /// Column count fixed during type examination.
        expected: usize,
        /// Column count of the current chunk.
        found: usize,
    },

    /// A categorical factor produced levels different from the frozen ones.
    #[error(
        "factor '{factor}' produced categorical data with unexpected levels (wanted {}, got {})",
        format_levels(.expected),
        format_levels(.found)
    )]
    LevelMismatch {
        /// Offending factor.
        factor: String,
        /// Levels frozen during type examination.
        expected: Vec<Level>,
        /// Levels of the current chunk.
        found: Vec<Level>,
    },

    /// A column builder was handed an output matrix of the wrong width.
    #[error("column builder produces {expected} columns but the output slice has {found}")]
    OutputWidthMismatch {
        /// Width declared by the column builder.
        expected: usize,
        /// Width of the output slice.
        found: usize,
    },

    /// A stateful factor could not finish its memorization passes.
    #[error("factor '{factor}' did not complete memorization: {reason}")]
    IncompleteMemorization {
        /// Offending factor.
        factor: String,
        /// What went wrong.
        reason: String,
    },

    /// Factors in one chunk disagree on the number of rows.
    #[error("factor '{factor}' has {found} rows, expected {expected}")]
    RowCountMismatch {
        /// Offending factor.
        factor: String,
        /// Row count of the chunk.
        expected: usize,
        /// Row count of this factor's data.
        found: usize,
    },

    /// No data was ever evaluated for a factor, so its type is unknown.
    #[error("factor '{factor}' could not be classified: the chunk source produced no data")]
    Unclassified {
        /// Offending factor.
        factor: String,
    },

    /// A name was not bound in the chunk or the default environment.
    #[error("Unknown variable: '{0}' is not bound in the data or the default environment")]
    UnknownVariable(String),

    /// A factor's input variable was not bound.
    #[error(
        "factor '{factor}': variable '{variable}' is not bound in the data or the default environment"
    )]
    UnboundVariable {
        /// Offending factor.
        factor: String,
        /// Name of the missing variable.
        variable: String,
    },

    /// A stateful transform name was not registered.
    #[error("Unknown stateful transform: '{0}'")]
    UnknownTransform(String),

    /// A contrast could not be coded for a level set.
    #[error("Invalid contrast: {0}")]
    InvalidContrast(String),

    /// Streaming chunk size is too small.
    #[error("Invalid chunk_size: {got} (must be at least {min})")]
    InvalidChunkSize {
        /// Requested chunk size.
        got: usize,
        /// Minimum allowed chunk size.
        min: usize,
    },

    /// A builder parameter was configured more than once.
    #[error(
        "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
    )]
    DuplicateParameter {
        /// Name of the duplicated parameter.
        parameter: &'static str,
    },

    /// Generic malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn format_levels(levels: &[Level]) -> String {
    let parts: Vec<String> = levels.iter().map(|l| l.to_string()).collect();
    format!("({})", parts.join(", "))
}
