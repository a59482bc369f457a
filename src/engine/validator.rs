//! Validation of evaluated values and configuration.
//!
//! ## Purpose
//!
//! This module centralizes the checks the pipeline applies to every evaluated
//! factor value (dimensionality, element kind, column count, level sequence)
//! and to the configuration handed to builders and adapters.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Factor-tagged**: Every data error names the originating factor.
//! * **Ordering**: Numeric checks run dimension, then column count, then
//!   element kind.
//!
//! ## Invariants
//!
//! * Validation is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not coerce or repair invalid values.

// Internal dependencies
use crate::primitives::categorical::Categorical;
use crate::primitives::errors::ModelError;
use crate::primitives::value::{Level, Value};

/// Maximum dimensionality of a numeric factor value.
pub const MAX_NUMERIC_DIMS: usize = 2;

/// Maximum dimensionality of a boolean, label or categorical factor value.
pub const MAX_CATEGORICAL_DIMS: usize = 1;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for evaluated values and configuration.
///
/// Provides static methods returning `Result<(), ModelError>` that fail fast
/// upon identifying the first violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Value Validation
    // ========================================================================

    /// Validate that a value has at most `max` dimensions.
    pub fn validate_dims(factor: &str, ndim: usize, max: usize) -> Result<(), ModelError> {
        if ndim > max {
            return Err(ModelError::TooManyDimensions {
                factor: factor.to_string(),
                ndim,
                max,
            });
        }
        Ok(())
    }

    /// Validate a numeric factor value against its fixed column count.
    pub fn validate_numeric<T>(
        factor: &str,
        value: &Value<T>,
        expected_columns: usize,
    ) -> Result<(), ModelError> {
        // Check 1: Dimensionality
        Self::validate_dims(factor, value.ndim(), MAX_NUMERIC_DIMS)?;

        // Check 2: Column count
        let (_, found) = value.shape_2d();
        if found != expected_columns {
            return Err(ModelError::ColumnCountMismatch {
                factor: factor.to_string(),
                expected: expected_columns,
                found,
            });
        }

        // Check 3: Element kind
        if !matches!(value, Value::Numeric(_)) {
            return Err(ModelError::TypeMismatch {
                factor: factor.to_string(),
                expected: "numeric",
                found: value.kind(),
            });
        }
        Ok(())
    }

    /// Validate categorical data against the frozen level sequence.
    pub fn validate_categorical(
        factor: &str,
        value: &Categorical,
        expected_levels: &[Level],
    ) -> Result<(), ModelError> {
        if value.levels() != expected_levels {
            return Err(ModelError::LevelMismatch {
                factor: factor.to_string(),
                expected: expected_levels.to_vec(),
                found: value.levels().to_vec(),
            });
        }
        Self::validate_dims(factor, value.codes().ndim(), MAX_CATEGORICAL_DIMS)
    }

    /// Validate that a factor produced the chunk's row count.
    pub fn validate_row_count(factor: &str, expected: usize, found: usize) -> Result<(), ModelError> {
        if expected != found {
            return Err(ModelError::RowCountMismatch {
                factor: factor.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Configuration Validation
    // ========================================================================

    /// Validate the number of rows per chunk in streaming mode.
    pub fn validate_chunk_size(chunk_size: usize, min: usize) -> Result<(), ModelError> {
        if chunk_size < min {
            return Err(ModelError::InvalidChunkSize {
                got: chunk_size,
                min,
            });
        }
        Ok(())
    }

    /// Validate that no parameters were set multiple times in the builder.
    pub fn validate_no_duplicates(duplicate_param: Option<&'static str>) -> Result<(), ModelError> {
        if let Some(param) = duplicate_param {
            return Err(ModelError::DuplicateParameter { parameter: param });
        }
        Ok(())
    }
}
