//! Memorization orchestrator.
//!
//! ## Purpose
//!
//! This module drives the multi-pass state-building protocol: it asks every
//! factor how many full passes over the data it needs, then re-iterates the
//! chunk source until every stateful factor has finished its last pass.
//!
//! ## Design notes
//!
//! * **Shared passes**: All active factors see the same traversal; the number
//!   of traversals is the largest pass count requested.
//! * **Early retirement**: A factor stops receiving calls once its final pass
//!   is finished.
//! * **Stream fingerprint**: Row counts per chunk from the first pass are
//!   compared against every later pass to catch non-restartable sources.
//!
//! ## Invariants
//!
//! * A factor needing 0 passes never receives a memorize call.
//! * A factor needing N passes receives `memorize_chunk` once per chunk per
//!   pass for passes `0..N`, and `memorize_finish` once per pass, in order.
//!
//! ## Non-goals
//!
//! * This module does not classify factors (see `engine::examine`).

// External dependencies
use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, trace};

// Internal dependencies
use crate::algorithms::factor::FactorRef;
use crate::algorithms::state::FactorState;
use crate::algorithms::transforms::TransformRegistry;
use crate::math::scalar::ModelFloat;
use crate::primitives::chunk::{Chunk, ChunkSource, EvalEnv};
use crate::primitives::errors::ModelError;

/// Factor states keyed by factor name.
pub type FactorStates<T> = BTreeMap<String, FactorState<T>>;

/// Memorized factor states, shared read-only.
pub type FrozenStates<T> = BTreeMap<String, Arc<FactorState<T>>>;

/// Run memorization for every factor and return their states.
///
/// `factors` may contain the same factor more than once; it is memorized once.
pub fn memorize_factors<T, S>(
    factors: &[FactorRef<T>],
    registry: &TransformRegistry<T>,
    defaults: &Chunk<T>,
    source: &S,
) -> Result<FactorStates<T>, ModelError>
where
    T: ModelFloat,
    S: ChunkSource<T> + ?Sized,
{
    let unique: BTreeMap<&str, &FactorRef<T>> =
        factors.iter().map(|f| (f.name(), f)).collect();

    let mut states = FactorStates::new();
    let mut active: Vec<(&FactorRef<T>, usize)> = Vec::new();
    for (&name, &factor) in &unique {
        let mut state = FactorState::new();
        let passes = factor.memorize_passes_needed(&mut state, registry)?;
        if passes > 0 {
            active.push((factor, passes));
        }
        states.insert(name.to_string(), state);
    }

    let mut fingerprint: Vec<Option<usize>> = Vec::new();
    let mut which_pass = 0;
    while !active.is_empty() {
        debug!(
            "memorization pass {}: {} active factor(s)",
            which_pass,
            active.len()
        );

        let mut observed = Vec::with_capacity(fingerprint.len());
        for (chunk_index, chunk) in source.chunks().enumerate() {
            trace!("memorization pass {}: chunk {}", which_pass, chunk_index);
            observed.push(chunk.nrows());
            let env = EvalEnv::new(&chunk, defaults);
            for (factor, _) in &active {
                let state = state_for(&mut states, factor)?;
                factor.memorize_chunk(state, which_pass, &env)?;
            }
        }

        if which_pass == 0 {
            fingerprint = observed;
        } else if observed != fingerprint {
            let (factor, _) = active[0];
            return Err(ModelError::IncompleteMemorization {
                factor: factor.name().to_string(),
                reason: format!(
                    "chunk source yielded {} chunk(s) on pass {} but {} on pass 0, or different row counts",
                    observed.len(),
                    which_pass,
                    fingerprint.len()
                ),
            });
        }

        for (factor, _) in &active {
            let state = state_for(&mut states, factor)?;
            factor.memorize_finish(state, which_pass)?;
        }

        active.retain(|(factor, passes)| {
            let done = which_pass + 1 >= *passes;
            if done {
                debug!("factor '{}' finished memorization", factor.name());
            }
            !done
        });
        which_pass += 1;
    }

    Ok(states)
}

fn state_for<'s, T: ModelFloat>(
    states: &'s mut FactorStates<T>,
    factor: &FactorRef<T>,
) -> Result<&'s mut FactorState<T>, ModelError> {
    states
        .get_mut(factor.name())
        .ok_or_else(|| ModelError::IncompleteMemorization {
            factor: factor.name().to_string(),
            reason: "factor state missing".to_string(),
        })
}

/// Freeze memorized states for shared read-only use.
pub fn freeze_states<T>(states: FactorStates<T>) -> FrozenStates<T> {
    states
        .into_iter()
        .map(|(name, state)| (name, Arc::new(state)))
        .collect()
}
