//! Factor evaluators.
//!
//! ## Purpose
//!
//! This module binds each factor to its memorized state and frozen
//! classification, and converts one chunk at a time into the matrix data a
//! column builder consumes. Every call re-checks the evaluated value against
//! the decisions made during type examination.
//!
//! ## Design notes
//!
//! * **Pure**: Evaluators only read their state and classification; nothing
//!   decided earlier is ever changed.
//! * **Shared**: State and default bindings are held behind `Arc`, so cloning
//!   an evaluator is cheap.
//! * **Two kinds**: [`FactorEvaluator`] dispatches statically over the numeric
//!   and categorical evaluators.
//!
//! ## Invariants
//!
//! * Numeric output is always exactly `expected_columns` wide.
//! * Categorical output always uses the frozen level order.
//!
//! ## Non-goals
//!
//! * This module does not build interaction columns.

// External dependencies
use std::sync::Arc;

use nalgebra::DMatrix;

// Internal dependencies
use crate::algorithms::categorical::Postprocessor;
use crate::algorithms::factor::FactorRef;
use crate::algorithms::state::FactorState;
use crate::engine::examine::FactorKind;
use crate::engine::validator::Validator;
use crate::math::scalar::ModelFloat;
use crate::primitives::categorical::Categorical;
use crate::primitives::chunk::{Chunk, EvalEnv};
use crate::primitives::errors::ModelError;
use crate::primitives::value::{Level, Value};

pub use crate::algorithms::column_builder::FactorValues;

// ============================================================================
// Numeric Evaluator
// ============================================================================

/// Evaluates a numeric factor to a rows × `expected_columns` matrix.
#[derive(Debug, Clone)]
pub struct NumericEvaluator<T: ModelFloat> {
    factor: FactorRef<T>,
    state: Arc<FactorState<T>>,
    expected_columns: usize,
    defaults: Arc<Chunk<T>>,
}

impl<T: ModelFloat> NumericEvaluator<T> {
    /// Bind a factor to its state and column count.
    pub fn new(
        factor: FactorRef<T>,
        state: Arc<FactorState<T>>,
        expected_columns: usize,
        defaults: Arc<Chunk<T>>,
    ) -> Self {
        Self {
            factor,
            state,
            expected_columns,
            defaults,
        }
    }

    /// Column count fixed during type examination.
    #[inline]
    pub fn expected_columns(&self) -> usize {
        self.expected_columns
    }

    /// Evaluate one chunk.
    pub fn eval(&self, chunk: &Chunk<T>) -> Result<DMatrix<T>, ModelError> {
        let name = self.factor.name();
        let env = EvalEnv::new(chunk, &self.defaults);
        let value = self.factor.eval(&self.state, &env)?;
        Validator::validate_numeric(name, &value, self.expected_columns)?;
        match value {
            Value::Numeric(array) => {
                let (nrows, ncols) = array.shape_2d();
                Ok(DMatrix::from_row_slice(nrows, ncols, array.data()))
            }
            other => Err(ModelError::TypeMismatch {
                factor: name.to_string(),
                expected: "numeric",
                found: other.kind(),
            }),
        }
    }
}

// ============================================================================
// Categorical Evaluator
// ============================================================================

/// Evaluates a categorical factor to one level index per row.
#[derive(Debug, Clone)]
pub struct CategoricalEvaluator<T: ModelFloat> {
    factor: FactorRef<T>,
    state: Arc<FactorState<T>>,
    postprocessor: Option<Postprocessor>,
    expected_levels: Vec<Level>,
    defaults: Arc<Chunk<T>>,
}

impl<T: ModelFloat> CategoricalEvaluator<T> {
    /// Bind a factor to its state, postprocessor and frozen levels.
    pub fn new(
        factor: FactorRef<T>,
        state: Arc<FactorState<T>>,
        postprocessor: Option<Postprocessor>,
        expected_levels: Vec<Level>,
        defaults: Arc<Chunk<T>>,
    ) -> Self {
        Self {
            factor,
            state,
            postprocessor,
            expected_levels,
            defaults,
        }
    }

    /// Levels frozen during type examination.
    #[inline]
    pub fn expected_levels(&self) -> &[Level] {
        &self.expected_levels
    }

    /// Evaluate one chunk.
    pub fn eval(&self, chunk: &Chunk<T>) -> Result<Vec<usize>, ModelError> {
        let name = self.factor.name();
        let env = EvalEnv::new(chunk, &self.defaults);
        let value = self.factor.eval(&self.state, &env)?;
        let categorical = self.to_categorical(name, value)?;
        Validator::validate_categorical(name, &categorical, &self.expected_levels)?;
        Ok(categorical.codes().data().to_vec())
    }

    fn to_categorical(&self, name: &str, value: Value<T>) -> Result<Categorical, ModelError> {
        if let Some(postprocessor) = &self.postprocessor {
            return postprocessor.transform(name, value);
        }
        match value {
            Value::Categorical(categorical) => Ok(categorical),
            other => Err(ModelError::TypeMismatch {
                factor: name.to_string(),
                expected: "categorical",
                found: other.kind(),
            }),
        }
    }
}

// ============================================================================
// Factor Evaluator
// ============================================================================

/// Either kind of evaluator.
#[derive(Debug, Clone)]
pub enum FactorEvaluator<T: ModelFloat> {
    /// Numeric factor.
    Numeric(NumericEvaluator<T>),

    /// Categorical factor.
    Categorical(CategoricalEvaluator<T>),
}

impl<T: ModelFloat> FactorEvaluator<T> {
    /// Build the evaluator matching a factor's classification.
    pub fn new(
        factor: FactorRef<T>,
        state: Arc<FactorState<T>>,
        kind: &FactorKind,
        defaults: Arc<Chunk<T>>,
    ) -> Self {
        match kind {
            FactorKind::Numeric { columns } => {
                FactorEvaluator::Numeric(NumericEvaluator::new(factor, state, *columns, defaults))
            }
            FactorKind::Categorical {
                levels,
                postprocessor,
                ..
            } => FactorEvaluator::Categorical(CategoricalEvaluator::new(
                factor,
                state,
                postprocessor.clone(),
                levels.clone(),
                defaults,
            )),
        }
    }

    /// Evaluate one chunk.
    pub fn eval(&self, chunk: &Chunk<T>) -> Result<FactorValues<T>, ModelError> {
        match self {
            FactorEvaluator::Numeric(e) => e.eval(chunk).map(FactorValues::Numeric),
            FactorEvaluator::Categorical(e) => e.eval(chunk).map(FactorValues::Categorical),
        }
    }

    /// Name of the evaluated factor.
    pub fn factor_name(&self) -> &str {
        match self {
            FactorEvaluator::Numeric(e) => e.factor.name(),
            FactorEvaluator::Categorical(e) => e.factor.name(),
        }
    }
}
