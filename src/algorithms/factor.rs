//! Factors, terms and model descriptions.
//!
//! ## Purpose
//!
//! This module defines the [`Factor`] protocol every model input implements,
//! two built-in factors, and the [`Term`] and [`ModelDesc`] types used to
//! describe which factor interactions a model contains.
//!
//! ## Design notes
//!
//! * **Trait objects**: Factors are shared as `Arc<dyn Factor<T>>`; their
//!   identity is their name.
//! * **Explicit state**: A factor keeps nothing between calls; everything it
//!   learns goes into the [`FactorState`] the pipeline hands it.
//! * **Set equality**: Two terms are equal when they contain the same factor
//!   names, regardless of order.
//!
//! ## Key concepts
//!
//! * **Lookup factor**: evaluates to a bound variable, needs no memorization.
//! * **Transform factor**: applies a registered stateful transform to a bound
//!   numeric variable, memorizing it over as many passes as the transform needs.
//! * **Intercept**: the term with no factors.
//!
//! ## Invariants
//!
//! * A term holds each factor name at most once.
//!
//! ## Non-goals
//!
//! * This module does not parse formulas.

// External dependencies
use core::fmt::Debug;
use core::hash::{Hash, Hasher};
use std::collections::BTreeSet;
use std::sync::Arc;

// Internal dependencies
use crate::algorithms::state::{FactorState, StateEntry};
use crate::algorithms::transforms::TransformRegistry;
use crate::math::scalar::ModelFloat;
use crate::primitives::chunk::EvalEnv;
use crate::primitives::errors::ModelError;
use crate::primitives::value::{RawArray, Value};

// ============================================================================
// Factor Protocol
// ============================================================================

/// A named model input, possibly with state memorized from the data stream.
pub trait Factor<T: ModelFloat>: Debug {
    /// Stable name; used as the factor's identity and in column names.
    fn name(&self) -> &str;

    /// Initialize `state` and return the number of memorization passes needed.
    fn memorize_passes_needed(
        &self,
        state: &mut FactorState<T>,
        registry: &TransformRegistry<T>,
    ) -> Result<usize, ModelError>;

    /// Observe one chunk during pass `which_pass`.
    fn memorize_chunk(
        &self,
        state: &mut FactorState<T>,
        which_pass: usize,
        env: &EvalEnv<'_, T>,
    ) -> Result<(), ModelError>;

    /// Close pass `which_pass`.
    fn memorize_finish(&self, state: &mut FactorState<T>, which_pass: usize)
        -> Result<(), ModelError>;

    /// Evaluate against one chunk using memorized state.
    fn eval(&self, state: &FactorState<T>, env: &EvalEnv<'_, T>) -> Result<Value<T>, ModelError>;
}

/// Shared handle to a factor.
pub type FactorRef<T> = Arc<dyn Factor<T>>;

// ============================================================================
// Lookup Factor
// ============================================================================

/// Evaluates to the value bound to its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFactor {
    name: String,
}

impl LookupFactor {
    /// Factor bound to variable `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Shared handle, ready to put in a [`Term`].
    pub fn shared<T: ModelFloat>(name: impl Into<String>) -> FactorRef<T> {
        Arc::new(Self::new(name))
    }
}

impl<T: ModelFloat> Factor<T> for LookupFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn memorize_passes_needed(
        &self,
        _state: &mut FactorState<T>,
        _registry: &TransformRegistry<T>,
    ) -> Result<usize, ModelError> {
        Ok(0)
    }

    fn memorize_chunk(
        &self,
        _state: &mut FactorState<T>,
        _which_pass: usize,
        _env: &EvalEnv<'_, T>,
    ) -> Result<(), ModelError> {
        Ok(())
    }

    fn memorize_finish(
        &self,
        _state: &mut FactorState<T>,
        _which_pass: usize,
    ) -> Result<(), ModelError> {
        Ok(())
    }

    fn eval(&self, _state: &FactorState<T>, env: &EvalEnv<'_, T>) -> Result<Value<T>, ModelError> {
        env.lookup(&self.name).cloned()
    }
}

// ============================================================================
// Transform Factor
// ============================================================================

const TRANSFORM_KEY: &str = "transform";

/// Applies a registered stateful transform to a numeric variable.
///
/// Named `transform(variable)`, e.g. `center(x)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFactor {
    name: String,
    transform: String,
    variable: String,
}

impl TransformFactor {
    /// Factor applying `transform` to `variable`.
    pub fn new(transform: impl Into<String>, variable: impl Into<String>) -> Self {
        let transform = transform.into();
        let variable = variable.into();
        Self {
            name: format!("{}({})", transform, variable),
            transform,
            variable,
        }
    }

    /// Shared handle, ready to put in a [`Term`].
    pub fn shared<T: ModelFloat>(
        transform: impl Into<String>,
        variable: impl Into<String>,
    ) -> FactorRef<T> {
        Arc::new(Self::new(transform, variable))
    }

    /// Name of the transform.
    pub fn transform_name(&self) -> &str {
        &self.transform
    }

    /// Name of the transformed variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    fn numeric_input<'a, T>(&self, env: &EvalEnv<'a, T>) -> Result<&'a RawArray<T>, ModelError> {
        let value = env
            .get(&self.variable)
            .ok_or_else(|| ModelError::UnboundVariable {
                factor: self.name.clone(),
                variable: self.variable.clone(),
            })?;
        match value {
            Value::Numeric(array) => Ok(array),
            other => Err(ModelError::TypeMismatch {
                factor: self.name.clone(),
                expected: "numeric",
                found: other.kind(),
            }),
        }
    }

    fn missing_transform(&self) -> ModelError {
        ModelError::IncompleteMemorization {
            factor: self.name.clone(),
            reason: format!("no '{}' transform in factor state", self.transform),
        }
    }
}

impl<T: ModelFloat> Factor<T> for TransformFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn memorize_passes_needed(
        &self,
        state: &mut FactorState<T>,
        registry: &TransformRegistry<T>,
    ) -> Result<usize, ModelError> {
        let transform = registry.create(&self.transform)?;
        let passes = transform.passes_needed();
        state.insert(TRANSFORM_KEY, StateEntry::Transform(transform));
        Ok(passes)
    }

    fn memorize_chunk(
        &self,
        state: &mut FactorState<T>,
        which_pass: usize,
        env: &EvalEnv<'_, T>,
    ) -> Result<(), ModelError> {
        let input = self.numeric_input(env)?;
        state
            .transform_mut(TRANSFORM_KEY)
            .ok_or_else(|| self.missing_transform())?
            .memorize_chunk(which_pass, input)
    }

    fn memorize_finish(
        &self,
        state: &mut FactorState<T>,
        which_pass: usize,
    ) -> Result<(), ModelError> {
        state
            .transform_mut(TRANSFORM_KEY)
            .ok_or_else(|| self.missing_transform())?
            .memorize_finish(which_pass)
    }

    fn eval(&self, state: &FactorState<T>, env: &EvalEnv<'_, T>) -> Result<Value<T>, ModelError> {
        let input = self.numeric_input(env)?;
        let transform = state
            .transform(TRANSFORM_KEY)
            .ok_or_else(|| self.missing_transform())?;
        Ok(Value::Numeric(transform.transform(input)?))
    }
}

// ============================================================================
// Term
// ============================================================================

/// An interaction of distinct factors; the empty term is the intercept.
#[derive(Debug, Clone)]
pub struct Term<T: ModelFloat> {
    factors: Vec<FactorRef<T>>,
}

impl<T: ModelFloat> Term<T> {
    /// Create a term; later duplicates of a factor name are dropped.
    pub fn new(factors: Vec<FactorRef<T>>) -> Self {
        let mut seen = BTreeSet::new();
        let factors = factors
            .into_iter()
            .filter(|f| seen.insert(f.name().to_string()))
            .collect();
        Self { factors }
    }

    /// The intercept term.
    pub fn intercept() -> Self {
        Self {
            factors: Vec::new(),
        }
    }

    /// Factors in term order.
    #[inline]
    pub fn factors(&self) -> &[FactorRef<T>] {
        &self.factors
    }

    /// Whether this is the intercept.
    #[inline]
    pub fn is_intercept(&self) -> bool {
        self.factors.is_empty()
    }

    /// Display name: `Intercept`, or factor names joined by `:`.
    pub fn name(&self) -> String {
        if self.factors.is_empty() {
            return "Intercept".to_string();
        }
        self.factors
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Whether the term contains a factor with this name.
    pub fn contains(&self, factor: &str) -> bool {
        self.factors.iter().any(|f| f.name() == factor)
    }

    fn name_set(&self) -> BTreeSet<&str> {
        self.factors.iter().map(|f| f.name()).collect()
    }
}

impl<T: ModelFloat> PartialEq for Term<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name_set() == other.name_set()
    }
}

impl<T: ModelFloat> Eq for Term<T> {}

impl<T: ModelFloat> Hash for Term<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name_set().hash(state);
    }
}

// ============================================================================
// Model Description
// ============================================================================

/// Left- and right-hand-side terms of a model.
#[derive(Debug, Clone)]
pub struct ModelDesc<T: ModelFloat> {
    lhs_terms: Vec<Term<T>>,
    rhs_terms: Vec<Term<T>>,
}

impl<T: ModelFloat> ModelDesc<T> {
    /// Describe a model from its two term lists.
    pub fn new(lhs_terms: Vec<Term<T>>, rhs_terms: Vec<Term<T>>) -> Self {
        Self {
            lhs_terms,
            rhs_terms,
        }
    }

    /// Left-hand-side terms.
    #[inline]
    pub fn lhs_terms(&self) -> &[Term<T>] {
        &self.lhs_terms
    }

    /// Right-hand-side terms.
    #[inline]
    pub fn rhs_terms(&self) -> &[Term<T>] {
        &self.rhs_terms
    }

    /// Every distinct factor, in order of first appearance (lhs then rhs).
    pub fn factors(&self) -> Vec<FactorRef<T>> {
        let mut seen = BTreeSet::new();
        self.lhs_terms
            .iter()
            .chain(self.rhs_terms.iter())
            .flat_map(|term| term.factors().iter())
            .filter(|f| seen.insert(f.name().to_string()))
            .cloned()
            .collect()
    }
}
