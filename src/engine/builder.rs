//! Model matrix builder and term assembly.
//!
//! ## Purpose
//!
//! This module assembles the column builders of every term into one model
//! matrix with a column-to-term index, and drives the factor evaluators over
//! each chunk to fill it.
//!
//! ## Design notes
//!
//! * **Buckets**: Terms are grouped by the set of numeric factors they
//!   contain. The bucket without numeric factors comes first, the rest follow
//!   in order of first appearance. Within a bucket, terms are stably ordered
//!   by factor count.
//! * **Subterms**: Each term is split into one column builder per subterm
//!   chosen by `algorithms::redundancy`, so categorical factors are coded
//!   full rank only where no lower-order term already spans that direction.
//! * **Single evaluation**: Each referenced factor is evaluated once per chunk
//!   and its values are shared by every term that uses it.
//!
//! ## Invariants
//!
//! * Column order equals the order of [`ColumnInfo::column_names`].
//! * All factors must agree on the number of rows of a chunk.
//!
//! ## Non-goals
//!
//! * This module does not decide factor classifications (see `engine::examine`).

// External dependencies
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use nalgebra::DMatrix;

// Internal dependencies
use crate::algorithms::column_builder::{ColumnBuilder, FactorCoding};
use crate::algorithms::factor::Term;
use crate::algorithms::redundancy::{pick_contrasts_for_term, UsedSubterms};
use crate::engine::column_info::ColumnInfo;
use crate::engine::evaluator::FactorEvaluator;
use crate::engine::examine::{FactorKind, FactorKinds};
use crate::engine::validator::Validator;
use crate::math::contrast::code_contrast_matrix;
use crate::math::scalar::ModelFloat;
use crate::primitives::chunk::Chunk;
use crate::primitives::errors::ModelError;

/// A term together with the column builders of its subterms.
pub type TermBuilders<T> = (Term<T>, Vec<ColumnBuilder<T>>);

// ============================================================================
// Term Assembly
// ============================================================================

/// Order terms into buckets and create their column builders.
pub fn assemble_term_builders<T: ModelFloat>(
    terms: &[Term<T>],
    kinds: &FactorKinds,
) -> Result<Vec<TermBuilders<T>>, ModelError> {
    let mut buckets: Vec<(BTreeSet<String>, Vec<&Term<T>>)> = Vec::new();
    let mut seen: Vec<&Term<T>> = Vec::new();
    for term in terms {
        if seen.contains(&term) {
            continue;
        }
        seen.push(term);

        let mut numeric = BTreeSet::new();
        for factor in term.factors() {
            if kind_of(kinds, factor.name())?.is_numeric() {
                numeric.insert(factor.name().to_string());
            }
        }
        match buckets.iter_mut().find(|(key, _)| *key == numeric) {
            Some((_, members)) => members.push(term),
            None => buckets.push((numeric, vec![term])),
        }
    }
    if let Some(i) = buckets.iter().position(|(key, _)| key.is_empty()) {
        let bucket = buckets.remove(i);
        buckets.insert(0, bucket);
    }

    let mut assembled = Vec::with_capacity(seen.len());
    for (_, mut members) in buckets {
        members.sort_by_key(|term| term.factors().len());
        let mut used = UsedSubterms::new();
        for term in members {
            let categorical: Vec<String> = term
                .factors()
                .iter()
                .map(|f| f.name().to_string())
                .filter(|name| matches!(kinds.get(name), Some(k) if !k.is_numeric()))
                .collect();

            let mut builders = Vec::new();
            for coding in pick_contrasts_for_term(&categorical, &mut used)? {
                let mut factors = Vec::with_capacity(term.factors().len());
                for factor in term.factors() {
                    let name = factor.name();
                    match kind_of(kinds, name)? {
                        FactorKind::Numeric { columns } => {
                            let coding = FactorCoding::Numeric { columns: *columns };
                            factors.push((name.to_string(), coding));
                        }
                        FactorKind::Categorical {
                            levels, contrast, ..
                        } => {
                            if let Some(&full) = coding.get(name) {
                                if levels.is_empty() {
                                    return Err(ModelError::InvalidContrast(format!(
                                        "factor '{}' has no levels; every chunk evaluated it to an empty array",
                                        name
                                    )));
                                }
                                let matrix = code_contrast_matrix(full, levels, contrast.as_ref())?;
                                factors.push((name.to_string(), FactorCoding::Categorical(matrix)));
                            }
                        }
                    }
                }
                builders.push(ColumnBuilder::new(factors));
            }
            debug!(
                "term '{}': {} column builder(s), {} column(s)",
                term.name(),
                builders.len(),
                builders.iter().map(ColumnBuilder::n_columns).sum::<usize>()
            );
            assembled.push((term.clone(), builders));
        }
    }
    Ok(assembled)
}

fn kind_of<'k>(kinds: &'k FactorKinds, factor: &str) -> Result<&'k FactorKind, ModelError> {
    kinds.get(factor).ok_or_else(|| ModelError::Unclassified {
        factor: factor.to_string(),
    })
}

// ============================================================================
// Model Matrix Builder
// ============================================================================

/// Builds one side (left or right) of a model.
#[derive(Debug, Clone)]
pub struct ModelMatrixBuilder<T: ModelFloat> {
    term_builders: Vec<TermBuilders<T>>,
    evaluators: BTreeMap<String, FactorEvaluator<T>>,
    column_info: ColumnInfo,
}

impl<T: ModelFloat> ModelMatrixBuilder<T> {
    /// Combine assembled terms with the evaluators of the factors they use.
    pub fn new(
        term_builders: Vec<TermBuilders<T>>,
        evaluators: BTreeMap<String, FactorEvaluator<T>>,
    ) -> Self {
        let column_info = ColumnInfo::from_terms(term_builders.iter().map(|(term, builders)| {
            (
                term.name(),
                builders.iter().flat_map(ColumnBuilder::column_names).collect(),
            )
        }));
        Self {
            term_builders,
            evaluators,
            column_info,
        }
    }

    /// Column layout of the matrices this builder produces.
    #[inline]
    pub fn column_info(&self) -> &ColumnInfo {
        &self.column_info
    }

    /// Terms, in column order.
    pub fn terms(&self) -> impl Iterator<Item = &Term<T>> {
        self.term_builders.iter().map(|(term, _)| term)
    }

    /// Number of output columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.column_info.n_columns()
    }

    /// Build the matrix for one chunk.
    pub fn build(&self, chunk: &Chunk<T>) -> Result<DMatrix<T>, ModelError> {
        let mut values = BTreeMap::new();
        let mut nrows: Option<usize> = None;
        for (name, evaluator) in &self.evaluators {
            let value = evaluator.eval(chunk)?;
            match nrows {
                Some(expected) => Validator::validate_row_count(name, expected, value.nrows())?,
                None => nrows = Some(value.nrows()),
            }
            values.insert(name.clone(), value);
        }
        let nrows = nrows.or_else(|| chunk.nrows()).unwrap_or(0);

        let mut out = DMatrix::zeros(nrows, self.n_columns());
        let mut start = 0;
        for (_, builders) in &self.term_builders {
            for builder in builders {
                let width = builder.n_columns();
                builder.build(&values, out.columns_mut(start, width))?;
                start += width;
            }
        }
        Ok(out)
    }
}
