//! Numeric element bound for model matrices.
//!
//! Model matrices are generic over their element type so callers can trade
//! precision for memory (`f32` vs `f64`), the same way the rest of the crate
//! is generic over `Float`.

// External dependencies
use core::fmt::Debug;
use num_traits::Float;

/// Element type of a model matrix.
///
/// Blanket-implemented for every `Float` that can live in an `nalgebra` matrix.
pub trait ModelFloat: Float + Debug + Send + Sync + 'static {
    /// Convert an `f64` constant, falling back to NaN when unrepresentable.
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        Self::from(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + Debug + Send + Sync + 'static> ModelFloat for T {}
