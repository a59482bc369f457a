//! Type examiner: numeric versus categorical classification.
//!
//! ## Purpose
//!
//! This module streams the data once, with early exit, to classify every
//! factor as numeric (with its column count) or categorical (with its frozen
//! level sequence, contrast and postprocessor). The result is computed once
//! and never revisited for the rest of the build.
//!
//! ## Design notes
//!
//! * **Early exit**: Numeric, boolean and categorical values are classified
//!   from their first chunk. Only label-valued factors keep reading, because
//!   their level set is the union over the whole stream.
//! * **Tagged result**: Downstream code matches on [`FactorKind`] rather than
//!   inspecting values again.
//!
//! ## Invariants
//!
//! * Every factor is classified exactly once.
//! * Boolean factors always get levels `(false, true)`.
//!
//! ## Non-goals
//!
//! * This module does not validate later chunks (see `engine::evaluator`).

// External dependencies
use std::collections::BTreeMap;

use log::debug;

// Internal dependencies
use crate::algorithms::categorical::{LevelAccumulator, Postprocessor};
use crate::algorithms::factor::FactorRef;
use crate::engine::memorize::FrozenStates;
use crate::engine::validator::{Validator, MAX_CATEGORICAL_DIMS, MAX_NUMERIC_DIMS};
use crate::math::contrast::Contrast;
use crate::math::scalar::ModelFloat;
use crate::primitives::chunk::{Chunk, ChunkSource, EvalEnv};
use crate::primitives::errors::ModelError;
use crate::primitives::value::{Level, Value};

// ============================================================================
// Factor Kind
// ============================================================================

/// Classification of one factor.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorKind {
    /// Numeric data with a fixed column count.
    Numeric {
        /// Number of columns.
        columns: usize,
    },

    /// Categorical data with frozen levels.
    Categorical {
        /// Ordered levels.
        levels: Vec<Level>,

        /// Contrast carried by the data (treatment coding when `None`).
        contrast: Option<Contrast>,

        /// Conversion applied to each evaluated value, if any.
        postprocessor: Option<Postprocessor>,
    },
}

impl FactorKind {
    /// Whether the factor is numeric.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, FactorKind::Numeric { .. })
    }
}

/// Classifications keyed by factor name.
pub type FactorKinds = BTreeMap<String, FactorKind>;

// ============================================================================
// Examination
// ============================================================================

/// Classify every factor from the chunk stream.
pub fn examine_factor_types<T, S>(
    factors: &[FactorRef<T>],
    states: &FrozenStates<T>,
    defaults: &Chunk<T>,
    source: &S,
) -> Result<FactorKinds, ModelError>
where
    T: ModelFloat,
    S: ChunkSource<T> + ?Sized,
{
    let mut pending: BTreeMap<&str, &FactorRef<T>> =
        factors.iter().map(|f| (f.name(), f)).collect();
    let mut accumulators: BTreeMap<String, LevelAccumulator> = BTreeMap::new();
    let mut kinds = FactorKinds::new();
    let mut chunks_read = 0;

    if pending.is_empty() {
        return Ok(kinds);
    }

    for chunk in source.chunks() {
        chunks_read += 1;
        let env = EvalEnv::new(&chunk, defaults);

        let mut classified = Vec::new();
        for (&name, factor) in &pending {
            let state = states
                .get(name)
                .ok_or_else(|| ModelError::IncompleteMemorization {
                    factor: name.to_string(),
                    reason: "factor state missing".to_string(),
                })?;
            let value = factor.eval(state, &env)?;
            if let Some(kind) = classify(name, value, &mut accumulators)? {
                debug!("factor '{}' classified as {}", name, kind_label(&kind));
                kinds.insert(name.to_string(), kind);
                classified.push(name);
            }
        }
        for name in classified {
            pending.remove(name);
        }
        if pending.is_empty() {
            debug!("type examination finished early after {} chunk(s)", chunks_read);
            break;
        }
    }

    for name in pending.into_keys() {
        let accumulator = accumulators
            .remove(name)
            .ok_or_else(|| ModelError::Unclassified {
                factor: name.to_string(),
            })?;
        let levels = accumulator.finish();
        debug!(
            "factor '{}' classified as categorical ({} discovered level(s))",
            name,
            levels.len()
        );
        kinds.insert(
            name.to_string(),
            FactorKind::Categorical {
                postprocessor: Some(Postprocessor::Levels(levels.clone())),
                levels,
                contrast: None,
            },
        );
    }

    Ok(kinds)
}

/// Classify one evaluated value; `None` keeps the factor pending.
fn classify<T>(
    factor: &str,
    value: Value<T>,
    accumulators: &mut BTreeMap<String, LevelAccumulator>,
) -> Result<Option<FactorKind>, ModelError> {
    match value {
        Value::Categorical(categorical) => {
            Validator::validate_dims(factor, categorical.codes().ndim(), MAX_CATEGORICAL_DIMS)?;
            Ok(Some(FactorKind::Categorical {
                levels: categorical.levels().to_vec(),
                contrast: categorical.contrast().cloned(),
                postprocessor: None,
            }))
        }
        Value::Numeric(array) => {
            Validator::validate_dims(factor, array.ndim(), MAX_NUMERIC_DIMS)?;
            Ok(Some(FactorKind::Numeric {
                columns: array.shape_2d().1,
            }))
        }
        Value::Boolean(array) => {
            Validator::validate_dims(factor, array.ndim(), MAX_CATEGORICAL_DIMS)?;
            Ok(Some(FactorKind::Categorical {
                levels: vec![Level::Bool(false), Level::Bool(true)],
                contrast: None,
                postprocessor: Some(Postprocessor::BoolToCategorical),
            }))
        }
        Value::Labels(labels) => {
            Validator::validate_dims(factor, labels.ndim(), MAX_CATEGORICAL_DIMS)?;
            accumulators
                .entry(factor.to_string())
                .or_default()
                .add(&labels);
            Ok(None)
        }
    }
}

fn kind_label(kind: &FactorKind) -> String {
    match kind {
        FactorKind::Numeric { columns } => format!("numeric ({} column(s))", columns),
        FactorKind::Categorical { levels, .. } => format!("categorical ({} level(s))", levels.len()),
    }
}
