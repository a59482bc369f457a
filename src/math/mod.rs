//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides the pure numeric building blocks of model-matrix
//! construction:
//! - The numeric element bound shared by every matrix
//! - Mixed-radix enumeration of column combinations
//! - Contrast coding of categorical levels
//!
//! These are reusable building blocks with no pipeline-specific logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Numeric element bound.
pub mod scalar;

/// Odometer enumeration of index combinations.
pub mod odometer;

/// Contrast matrices and coding schemes.
pub mod contrast;
