//! Evaluated factor values.
//!
//! ## Purpose
//!
//! This module defines the data a factor hands back from `eval`: numeric,
//! boolean and label arrays of arbitrary dimension, and leveled categorical
//! data. It is the minimal value model the pipeline needs in order to inspect
//! dimensionality and element kind without knowing anything about the factor.
//!
//! ## Design notes
//!
//! * **Row-major**: [`RawArray`] stores its elements row-major, so axis 0 is the
//!   row axis and slicing rows is a contiguous copy.
//! * **Tagged**: [`Value`] is an enum; the element kind is known statically by
//!   variant rather than inspected at run time.
//! * **Generics**: Numeric arrays are generic over the matrix element type.
//!
//! ## Key concepts
//!
//! * **Column-default 2-d view**: a 0-d value is one row and one column, a 1-d
//!   value of length `n` is `n` rows and one column, a 2-d value keeps its shape.
//! * **Level**: one distinct category label (boolean, integer or text).
//!
//! ## Invariants
//!
//! * `data.len() == shape.iter().product()` for every `RawArray`.
//!
//! ## Non-goals
//!
//! * This module does not provide arithmetic on arrays.
//! * This module does not coerce between element kinds.

// External dependencies
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Internal dependencies
use crate::primitives::categorical::Categorical;
use crate::primitives::errors::ModelError;

// ============================================================================
// Level
// ============================================================================

/// A single categorical level.
///
/// Levels are totally ordered: all booleans sort before all integers, which
/// sort before all text labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    /// Boolean level.
    Bool(bool),

    /// Integer level.
    Int(i64),

    /// Text level.
    Text(String),
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Bool(b) => write!(f, "{}", b),
            Level::Int(i) => write!(f, "{}", i),
            Level::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        Level::Bool(value)
    }
}

impl From<i64> for Level {
    fn from(value: i64) -> Self {
        Level::Int(value)
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level::Int(i64::from(value))
    }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self {
        Level::Text(value.to_string())
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        Level::Text(value)
    }
}

// ============================================================================
// RawArray
// ============================================================================

/// Row-major n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArray<E> {
    data: Vec<E>,
    shape: Vec<usize>,
}

impl<E> RawArray<E> {
    /// Create a one-dimensional array.
    pub fn from_vec(data: Vec<E>) -> Self {
        let shape = vec![data.len()];
        Self { data, shape }
    }

    /// Create a zero-dimensional array holding a single element.
    pub fn scalar(value: E) -> Self {
        Self {
            data: vec![value],
            shape: Vec::new(),
        }
    }

    /// Create an array of arbitrary shape from row-major data.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<E>) -> Result<Self, ModelError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ModelError::InvalidInput(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { data, shape })
    }

    /// Create a two-dimensional array from equal-length rows.
    pub fn from_rows(rows: Vec<Vec<E>>) -> Result<Self, ModelError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(ModelError::InvalidInput(format!(
                    "ragged rows: row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    ncols
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            shape: vec![nrows, ncols],
        })
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Shape of the array.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major elements.
    #[inline]
    pub fn data(&self) -> &[E] {
        &self.data
    }

    /// Consume the array and return its row-major elements.
    pub fn into_data(self) -> Vec<E> {
        self.data
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Shape of the column-default two-dimensional view.
    ///
    /// Arrays with more than two dimensions report their first two axes; the
    /// dimension checks reject them before the view is used.
    pub fn shape_2d(&self) -> (usize, usize) {
        match self.shape.as_slice() {
            [] => (1, 1),
            [n] => (*n, 1),
            [r, c, ..] => (*r, *c),
        }
    }

    /// Map every element, keeping the shape.
    pub fn map<U, F: FnMut(&E) -> U>(&self, f: F) -> RawArray<U> {
        RawArray {
            data: self.data.iter().map(f).collect(),
            shape: self.shape.clone(),
        }
    }
}

impl<E: Clone> RawArray<E> {
    /// Copy rows `start..end` along axis 0.
    ///
    /// Zero-dimensional arrays have no row axis and are returned whole.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        if self.shape.is_empty() {
            return self.clone();
        }
        let stride: usize = self.shape[1..].iter().product();
        let end = end.min(self.shape[0]);
        let start = start.min(end);
        let mut shape = self.shape.clone();
        shape[0] = end - start;
        Self {
            data: self.data[start * stride..end * stride].to_vec(),
            shape,
        }
    }
}

impl<E> From<Vec<E>> for RawArray<E> {
    fn from(data: Vec<E>) -> Self {
        Self::from_vec(data)
    }
}

// ============================================================================
// Value
// ============================================================================

/// The result of evaluating a factor against one chunk of data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    /// Numeric data of any dimension.
    Numeric(RawArray<T>),

    /// Boolean data; always treated as categorical with levels `(false, true)`.
    Boolean(RawArray<bool>),

    /// Unleveled labels whose level set must be discovered from the data.
    Labels(RawArray<Level>),

    /// Leveled categorical data.
    Categorical(Categorical),
}

impl<T> Value<T> {
    /// One-dimensional numeric value.
    pub fn numeric(data: Vec<T>) -> Self {
        Value::Numeric(RawArray::from_vec(data))
    }

    /// Two-dimensional numeric value from rows.
    pub fn numeric_rows(rows: Vec<Vec<T>>) -> Result<Self, ModelError> {
        Ok(Value::Numeric(RawArray::from_rows(rows)?))
    }

    /// One-dimensional boolean value.
    pub fn boolean(data: Vec<bool>) -> Self {
        Value::Boolean(RawArray::from_vec(data))
    }

    /// One-dimensional label value.
    pub fn labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        Value::Labels(RawArray::from_vec(
            labels.into_iter().map(Into::into).collect(),
        ))
    }

    /// Human-readable element kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Numeric(_) => "numeric",
            Value::Boolean(_) => "boolean",
            Value::Labels(_) => "label",
            Value::Categorical(_) => "categorical",
        }
    }

    /// Shape of the underlying array (the code array for categorical data).
    pub fn shape(&self) -> &[usize] {
        match self {
            Value::Numeric(a) => a.shape(),
            Value::Boolean(a) => a.shape(),
            Value::Labels(a) => a.shape(),
            Value::Categorical(c) => c.codes().shape(),
        }
    }

    /// Number of dimensions of the underlying array.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Shape of the column-default two-dimensional view.
    pub fn shape_2d(&self) -> (usize, usize) {
        match self {
            Value::Numeric(a) => a.shape_2d(),
            Value::Boolean(a) => a.shape_2d(),
            Value::Labels(a) => a.shape_2d(),
            Value::Categorical(c) => c.codes().shape_2d(),
        }
    }
}

impl<T: Clone> Value<T> {
    /// Copy rows `start..end` along axis 0.
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        match self {
            Value::Numeric(a) => Value::Numeric(a.slice_rows(start, end)),
            Value::Boolean(a) => Value::Boolean(a.slice_rows(start, end)),
            Value::Labels(a) => Value::Labels(a.slice_rows(start, end)),
            Value::Categorical(c) => Value::Categorical(c.slice_rows(start, end)),
        }
    }
}
