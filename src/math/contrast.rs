//! Contrast coding for categorical factors.
//!
//! ## Purpose
//!
//! This module turns an ordered level set into a numeric contrast matrix
//! (levels × code columns) plus one naming suffix per code column. Each
//! contrast can be coded two ways: *full rank* (the coded columns span the
//! intercept, used when no lower-order term already does) and *reduced* (the
//! intercept direction is dropped).
//!
//! ## Design notes
//!
//! * **Treatment** (default): full rank is the identity with suffixes
//!   `[level]`; reduced drops the reference level, suffixes `[T.level]`.
//! * **Sum**: reduced is deviation coding against the omitted level with
//!   suffixes `[S.level]`; full rank prepends a `[mean]` column of ones.
//! * **Custom**: a caller-supplied matrix used as-is for both codings.
//! * **Generics**: Matrices are produced in the model's element type.
//!
//! ## Invariants
//!
//! * `matrix.nrows() == levels.len()`.
//! * `column_suffixes.len() == matrix.ncols()`.
//!
//! ## Non-goals
//!
//! * This module does not choose between full and reduced coding (see
//!   `algorithms::redundancy`).

// External dependencies
use nalgebra::DMatrix;

// Internal dependencies
use crate::math::scalar::ModelFloat;
use crate::primitives::errors::ModelError;
use crate::primitives::value::Level;

// ============================================================================
// Contrast Matrix
// ============================================================================

/// A coded contrast: numeric matrix plus per-column name suffixes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastMatrix<T: ModelFloat> {
    matrix: DMatrix<T>,
    column_suffixes: Vec<String>,
}

impl<T: ModelFloat> ContrastMatrix<T> {
    /// Create a contrast matrix, checking one suffix per column.
    pub fn new(matrix: DMatrix<T>, column_suffixes: Vec<String>) -> Result<Self, ModelError> {
        if matrix.ncols() != column_suffixes.len() {
            return Err(ModelError::InvalidContrast(format!(
                "{} column suffixes for a matrix with {} columns",
                column_suffixes.len(),
                matrix.ncols()
            )));
        }
        Ok(Self {
            matrix,
            column_suffixes,
        })
    }

    /// Levels × code-columns matrix.
    #[inline]
    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    /// One naming suffix per code column.
    #[inline]
    pub fn column_suffixes(&self) -> &[String] {
        &self.column_suffixes
    }

    /// Number of code columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Convert to another element type.
    pub fn cast<U: ModelFloat>(&self) -> ContrastMatrix<U> {
        ContrastMatrix {
            matrix: self
                .matrix
                .map(|v| U::from(v).unwrap_or_else(U::nan)),
            column_suffixes: self.column_suffixes.clone(),
        }
    }
}

// ============================================================================
// Contrast
// ============================================================================

/// Contrast scheme attached to a categorical factor.
#[derive(Debug, Clone, PartialEq)]
pub enum Contrast {
    /// Treatment (dummy) coding against a reference level (default: the first).
    Treatment {
        /// Index of the reference level.
        reference: Option<usize>,
    },

    /// Sum-to-zero (deviation) coding (default omitted level: the last).
    Sum {
        /// Index of the omitted level.
        omit: Option<usize>,
    },

    /// A fixed matrix used for both full-rank and reduced coding.
    Custom(ContrastMatrix<f64>),
}

impl Default for Contrast {
    fn default() -> Self {
        Contrast::Treatment { reference: None }
    }
}

impl Contrast {
    /// Code the levels so the columns span the intercept (full rank).
    pub fn code_with_intercept<T: ModelFloat>(
        &self,
        levels: &[Level],
    ) -> Result<ContrastMatrix<T>, ModelError> {
        match self {
            Contrast::Treatment { .. } => {
                let n = levels.len();
                let suffixes = levels.iter().map(|l| format!("[{}]", l)).collect();
                ContrastMatrix::new(DMatrix::identity(n, n), suffixes)
            }
            Contrast::Sum { omit } => {
                let reduced: ContrastMatrix<T> = self.sum_reduced(levels, *omit)?;
                let n = levels.len();
                let mut matrix = DMatrix::from_element(n, reduced.ncols() + 1, T::one());
                matrix.columns_mut(1, reduced.ncols()).copy_from(reduced.matrix());
                let mut suffixes = vec!["[mean]".to_string()];
                suffixes.extend(reduced.column_suffixes.iter().cloned());
                ContrastMatrix::new(matrix, suffixes)
            }
            Contrast::Custom(custom) => Self::check_custom(custom, levels),
        }
    }

    /// Code the levels with the intercept direction removed (reduced rank).
    pub fn code_without_intercept<T: ModelFloat>(
        &self,
        levels: &[Level],
    ) -> Result<ContrastMatrix<T>, ModelError> {
        match self {
            Contrast::Treatment { reference } => {
                let n = levels.len();
                let reference = Self::resolve_index(*reference, 0, n, "reference")?;
                let mut matrix = DMatrix::zeros(n, n.saturating_sub(1));
                let mut suffixes = Vec::with_capacity(n.saturating_sub(1));
                for (col, (row, level)) in levels
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != reference)
                    .enumerate()
                {
                    matrix[(row, col)] = T::one();
                    suffixes.push(format!("[T.{}]", level));
                }
                ContrastMatrix::new(matrix, suffixes)
            }
            Contrast::Sum { omit } => self.sum_reduced(levels, *omit),
            Contrast::Custom(custom) => Self::check_custom(custom, levels),
        }
    }

    fn sum_reduced<T: ModelFloat>(
        &self,
        levels: &[Level],
        omit: Option<usize>,
    ) -> Result<ContrastMatrix<T>, ModelError> {
        let n = levels.len();
        let omit = Self::resolve_index(omit, n.saturating_sub(1), n, "omit")?;
        let mut matrix = DMatrix::zeros(n, n.saturating_sub(1));
        let mut suffixes = Vec::with_capacity(n.saturating_sub(1));
        for (col, (row, level)) in levels
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != omit)
            .enumerate()
        {
            matrix[(row, col)] = T::one();
            suffixes.push(format!("[S.{}]", level));
        }
        for col in 0..matrix.ncols() {
            matrix[(omit, col)] = -T::one();
        }
        ContrastMatrix::new(matrix, suffixes)
    }

    fn resolve_index(
        index: Option<usize>,
        default: usize,
        n_levels: usize,
        what: &str,
    ) -> Result<usize, ModelError> {
        if n_levels == 0 {
            return Err(ModelError::InvalidContrast(
                "cannot code a factor with no levels".to_string(),
            ));
        }
        let index = index.unwrap_or(default);
        if index >= n_levels {
            return Err(ModelError::InvalidContrast(format!(
                "{} level index {} out of range for {} levels",
                what, index, n_levels
            )));
        }
        Ok(index)
    }

    fn check_custom<T: ModelFloat>(
        custom: &ContrastMatrix<f64>,
        levels: &[Level],
    ) -> Result<ContrastMatrix<T>, ModelError> {
        if custom.matrix.nrows() != levels.len() {
            return Err(ModelError::InvalidContrast(format!(
                "custom contrast has {} rows but the factor has {} levels",
                custom.matrix.nrows(),
                levels.len()
            )));
        }
        Ok(custom.cast())
    }
}

/// Code a level set, defaulting to treatment coding.
pub fn code_contrast_matrix<T: ModelFloat>(
    intercept: bool,
    levels: &[Level],
    contrast: Option<&Contrast>,
) -> Result<ContrastMatrix<T>, ModelError> {
    let default = Contrast::default();
    let contrast = contrast.unwrap_or(&default);
    if intercept {
        contrast.code_with_intercept(levels)
    } else {
        contrast.code_without_intercept(levels)
    }
}
