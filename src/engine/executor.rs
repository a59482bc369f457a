//! Execution engine for model-spec construction.
//!
//! ## Purpose
//!
//! This module orchestrates the three phases that turn model descriptions and
//! a restartable chunk source into model-matrix builders: memorization of
//! stateful factors, type examination, and assembly of evaluators and column
//! builders for both sides of every model.
//!
//! ## Design notes
//!
//! * **Shared phases**: Factors used by several descriptions are memorized
//!   and examined once; all descriptions share the resulting decisions.
//! * **Strict ordering**: Memorize, then examine, then assemble. No phase
//!   starts before the previous one has consumed its passes.
//! * **Configuration**: An [`ExecutorConfig`] carries the transform registry
//!   and default bindings; [`ModelExecutor`] offers the same settings fluently.
//!
//! ## Key concepts
//!
//! * **Referenced factors**: each side's builder receives evaluators only for
//!   the factors its own terms use.
//!
//! ## Invariants
//!
//! * Factor states are frozen before examination begins.
//! * Every builder pair is produced from the same classifications.
//!
//! ## Non-goals
//!
//! * This module does not build any matrix (see `engine::builder`).

// External dependencies
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;

// Internal dependencies
use crate::algorithms::factor::{FactorRef, ModelDesc, Term};
use crate::algorithms::transforms::TransformRegistry;
use crate::engine::builder::{assemble_term_builders, ModelMatrixBuilder};
use crate::engine::evaluator::FactorEvaluator;
use crate::engine::examine::{examine_factor_types, FactorKinds};
use crate::engine::memorize::{freeze_states, memorize_factors, FrozenStates};
use crate::math::scalar::ModelFloat;
use crate::primitives::chunk::{Chunk, ChunkSource};
use crate::primitives::errors::ModelError;

// ============================================================================
// Configuration
// ============================================================================

/// Settings for one model-spec construction.
#[derive(Debug, Clone)]
pub struct ExecutorConfig<T: ModelFloat> {
    /// Stateful transforms factors may request.
    pub registry: TransformRegistry<T>,

    /// Bindings visible to every factor when the chunk lacks a name.
    pub defaults: Chunk<T>,
}

impl<T: ModelFloat> Default for ExecutorConfig<T> {
    fn default() -> Self {
        Self {
            registry: TransformRegistry::with_builtins(),
            defaults: Chunk::new(),
        }
    }
}

/// Result of running the executor.
#[derive(Debug, Clone)]
pub struct ExecutorOutput<T: ModelFloat> {
    /// One `(lhs, rhs)` builder pair per model description, in input order.
    pub builders: Vec<(ModelMatrixBuilder<T>, ModelMatrixBuilder<T>)>,

    /// Classification of every factor.
    pub kinds: FactorKinds,
}

// ============================================================================
// Executor
// ============================================================================

/// Runs memorization, examination and assembly.
#[derive(Debug, Clone)]
pub struct ModelExecutor<T: ModelFloat> {
    registry: TransformRegistry<T>,
    defaults: Arc<Chunk<T>>,
}

impl<T: ModelFloat> Default for ModelExecutor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ModelFloat> ModelExecutor<T> {
    /// Create an executor with the built-in transforms and no defaults.
    pub fn new() -> Self {
        Self::from_config(ExecutorConfig::default())
    }

    /// Create an executor from a configuration.
    pub fn from_config(config: ExecutorConfig<T>) -> Self {
        Self {
            registry: config.registry,
            defaults: Arc::new(config.defaults),
        }
    }

    /// Set the stateful transform registry.
    pub fn stateful_transforms(mut self, registry: TransformRegistry<T>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the default bindings.
    pub fn default_env(mut self, defaults: Chunk<T>) -> Self {
        self.defaults = Arc::new(defaults);
        self
    }

    /// Run all phases for the given descriptions over `source`.
    pub fn run<S>(&self, descs: &[ModelDesc<T>], source: &S) -> Result<ExecutorOutput<T>, ModelError>
    where
        S: ChunkSource<T> + ?Sized,
    {
        let factors = distinct_factors(descs);
        debug!(
            "building {} model spec(s) over {} distinct factor(s)",
            descs.len(),
            factors.len()
        );

        let states = memorize_factors(&factors, &self.registry, &self.defaults, source)?;
        let states = freeze_states(states);
        let kinds = examine_factor_types(&factors, &states, &self.defaults, source)?;

        let mut builders = Vec::with_capacity(descs.len());
        for desc in descs {
            let lhs = self.side(desc.lhs_terms(), &factors, &states, &kinds)?;
            let rhs = self.side(desc.rhs_terms(), &factors, &states, &kinds)?;
            builders.push((lhs, rhs));
        }

        Ok(ExecutorOutput { builders, kinds })
    }

    fn side(
        &self,
        terms: &[Term<T>],
        factors: &[FactorRef<T>],
        states: &FrozenStates<T>,
        kinds: &FactorKinds,
    ) -> Result<ModelMatrixBuilder<T>, ModelError> {
        let referenced: BTreeSet<&str> = terms
            .iter()
            .flat_map(|term| term.factors().iter().map(|f| f.name()))
            .collect();

        let mut evaluators = BTreeMap::new();
        for factor in factors.iter().filter(|f| referenced.contains(f.name())) {
            let name = factor.name();
            let state = states
                .get(name)
                .cloned()
                .ok_or_else(|| ModelError::IncompleteMemorization {
                    factor: name.to_string(),
                    reason: "factor state missing".to_string(),
                })?;
            let kind = kinds.get(name).ok_or_else(|| ModelError::Unclassified {
                factor: name.to_string(),
            })?;
            let evaluator = FactorEvaluator::new(Arc::clone(factor), state, kind, Arc::clone(&self.defaults));
            evaluators.insert(name.to_string(), evaluator);
        }

        let term_builders = assemble_term_builders(terms, kinds)?;
        Ok(ModelMatrixBuilder::new(term_builders, evaluators))
    }
}

/// Every distinct factor across descriptions, in order of first appearance.
fn distinct_factors<T: ModelFloat>(descs: &[ModelDesc<T>]) -> Vec<FactorRef<T>> {
    let mut seen = BTreeSet::new();
    descs
        .iter()
        .flat_map(ModelDesc::factors)
        .filter(|f| seen.insert(f.name().to_string()))
        .collect()
}
