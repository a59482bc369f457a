//! Interaction column construction for a single (sub)term.
//!
//! ## Purpose
//!
//! This module expands a term's factors into the cartesian product of their
//! contribution columns: contrast columns for categorical factors, raw columns
//! for numeric factors. It computes both the column names and, per chunk, the
//! column values as the row-wise product across each combination.
//!
//! ## Design notes
//!
//! * **One enumeration**: Names and values both walk the same [`Odometer`],
//!   so column order always equals name order.
//! * **Views**: Output is written into a caller-provided matrix view, so the
//!   model-matrix builder can hand out column slices of one allocation.
//! * **Generics**: Generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Width**: contrast column count for a categorical factor, numeric column
//!   count otherwise. A term produces `product(widths)` columns.
//! * **Name piece**: `name` for a one-column numeric factor, `name[i]` for a
//!   wider one, `name` + contrast suffix for a categorical factor.
//!
//! ## Invariants
//!
//! * `column_names().len() == product(widths)`.
//! * The empty factor list yields exactly one column, `Intercept`, of ones.
//!
//! ## Non-goals
//!
//! * This module does not evaluate factors (see `engine::evaluator`).

// External dependencies
use std::collections::BTreeMap;

use nalgebra::{DMatrix, DMatrixViewMut};

// Internal dependencies
use crate::math::contrast::ContrastMatrix;
use crate::math::odometer::Odometer;
use crate::math::scalar::ModelFloat;
use crate::primitives::errors::ModelError;

// ============================================================================
// Factor Values
// ============================================================================

/// One factor's evaluated data for a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorValues<T: ModelFloat> {
    /// Rows × columns numeric data.
    Numeric(DMatrix<T>),

    /// One level index per row.
    Categorical(Vec<usize>),
}

impl<T: ModelFloat> FactorValues<T> {
    /// Number of rows.
    pub fn nrows(&self) -> usize {
        match self {
            FactorValues::Numeric(m) => m.nrows(),
            FactorValues::Categorical(codes) => codes.len(),
        }
    }
}

// ============================================================================
// Factor Coding
// ============================================================================

/// How one factor contributes columns to a term.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorCoding<T: ModelFloat> {
    /// Numeric factor with a fixed column count.
    Numeric {
        /// Number of columns.
        columns: usize,
    },

    /// Categorical factor coded by a contrast matrix.
    Categorical(ContrastMatrix<T>),
}

impl<T: ModelFloat> FactorCoding<T> {
    /// Number of contribution columns.
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            FactorCoding::Numeric { columns } => *columns,
            FactorCoding::Categorical(contrast) => contrast.ncols(),
        }
    }
}

// ============================================================================
// Column Builder
// ============================================================================

/// Builds the interaction columns of one (sub)term.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBuilder<T: ModelFloat> {
    factors: Vec<(String, FactorCoding<T>)>,
    widths: Vec<usize>,
}

impl<T: ModelFloat> ColumnBuilder<T> {
    /// Create a builder from factors in term order and their codings.
    pub fn new(factors: Vec<(String, FactorCoding<T>)>) -> Self {
        let widths = factors.iter().map(|(_, coding)| coding.width()).collect();
        Self { factors, widths }
    }

    /// Create a builder from factor names and per-kind lookup maps.
    ///
    /// A factor found in neither map is an error.
    pub fn from_maps(
        factors: &[String],
        num_columns: &BTreeMap<String, usize>,
        contrasts: &BTreeMap<String, ContrastMatrix<T>>,
    ) -> Result<Self, ModelError> {
        let mut coded = Vec::with_capacity(factors.len());
        for name in factors {
            let coding = if let Some(contrast) = contrasts.get(name) {
                FactorCoding::Categorical(contrast.clone())
            } else if let Some(&columns) = num_columns.get(name) {
                FactorCoding::Numeric { columns }
            } else {
                return Err(ModelError::InvalidInput(format!(
                    "factor '{}' has neither a column count nor a contrast",
                    name
                )));
            };
            coded.push((name.clone(), coding));
        }
        Ok(Self::new(coded))
    }

    /// Factor names in term order.
    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|(name, _)| name.as_str())
    }

    /// Per-factor column widths, in term order.
    #[inline]
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Number of output columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.widths.iter().product()
    }

    /// Output column names, in column order.
    pub fn column_names(&self) -> Vec<String> {
        if self.factors.is_empty() {
            return vec!["Intercept".to_string()];
        }
        Odometer::new(&self.widths)
            .map(|combo| {
                self.factors
                    .iter()
                    .zip(combo)
                    .map(|((name, coding), i)| match coding {
                        FactorCoding::Numeric { columns: 1 } => name.clone(),
                        FactorCoding::Numeric { .. } => format!("{}[{}]", name, i),
                        FactorCoding::Categorical(contrast) => {
                            format!("{}{}", name, contrast.column_suffixes()[i])
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(":")
            })
            .collect()
    }

    /// Fill `out` with this builder's columns for one chunk.
    ///
    /// `values` must hold every factor of the term, each with `out.nrows()`
    /// rows; `out` must be exactly [`n_columns`](Self::n_columns) wide.
    pub fn build(
        &self,
        values: &BTreeMap<String, FactorValues<T>>,
        mut out: DMatrixViewMut<'_, T>,
    ) -> Result<(), ModelError> {
        if out.ncols() != self.n_columns() {
            return Err(ModelError::OutputWidthMismatch {
                expected: self.n_columns(),
                found: out.ncols(),
            });
        }
        let nrows = out.nrows();

        let mut inputs = Vec::with_capacity(self.factors.len());
        for (name, coding) in &self.factors {
            let value = values.get(name).ok_or_else(|| {
                ModelError::InvalidInput(format!("no evaluated values for factor '{}'", name))
            })?;
            if value.nrows() != nrows {
                return Err(ModelError::RowCountMismatch {
                    factor: name.clone(),
                    expected: nrows,
                    found: value.nrows(),
                });
            }
            check_input(name, coding, value)?;
            inputs.push((coding, value));
        }

        out.fill(T::one());
        for (col, combo) in Odometer::new(&self.widths).enumerate() {
            for ((coding, value), &i) in inputs.iter().zip(combo.iter()) {
                match (coding, value) {
                    (FactorCoding::Categorical(contrast), FactorValues::Categorical(codes)) => {
                        let matrix = contrast.matrix();
                        for (row, &code) in codes.iter().enumerate() {
                            out[(row, col)] = out[(row, col)] * matrix[(code, i)];
                        }
                    }
                    (FactorCoding::Numeric { .. }, FactorValues::Numeric(data)) => {
                        for row in 0..nrows {
                            out[(row, col)] = out[(row, col)] * data[(row, i)];
                        }
                    }
                    // Rejected by `check_input`.
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn check_input<T: ModelFloat>(
    name: &str,
    coding: &FactorCoding<T>,
    value: &FactorValues<T>,
) -> Result<(), ModelError> {
    match (coding, value) {
        (FactorCoding::Numeric { columns }, FactorValues::Numeric(data)) => {
            if data.ncols() != *columns {
                return Err(ModelError::ColumnCountMismatch {
                    factor: name.to_string(),
                    expected: *columns,
                    found: data.ncols(),
                });
            }
            Ok(())
        }
        (FactorCoding::Categorical(contrast), FactorValues::Categorical(codes)) => {
            let n_levels = contrast.matrix().nrows();
            match codes.iter().find(|&&c| c >= n_levels) {
                Some(bad) => Err(ModelError::InvalidInput(format!(
                    "factor '{}' has level index {} but only {} levels",
                    name, bad, n_levels
                ))),
                None => Ok(()),
            }
        }
        (FactorCoding::Numeric { .. }, _) => Err(ModelError::TypeMismatch {
            factor: name.to_string(),
            expected: "numeric",
            found: "categorical",
        }),
        (FactorCoding::Categorical(_), _) => Err(ModelError::TypeMismatch {
            factor: name.to_string(),
            expected: "categorical",
            found: "numeric",
        }),
    }
}
