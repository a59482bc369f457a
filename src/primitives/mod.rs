//! Layer 1: Primitives
//!
//! # Purpose
//!
//! This layer defines the data every other layer passes around: the error
//! type, evaluated values and levels, categorical data, and chunks of streamed
//! input together with the restartable sources that produce them.
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
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Error type.
pub mod errors;

/// Evaluated values, arrays and levels.
pub mod value;

/// Leveled categorical data.
pub mod categorical;

/// Chunks, evaluation environments and chunk sources.
pub mod chunk;
