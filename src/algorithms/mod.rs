//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! This layer implements the model-building logic that does not depend on
//! how data is streamed:
//! - Per-factor state and stateful transforms
//! - The factor protocol, terms and model descriptions
//! - Level discovery and categorical postprocessing
//! - Full-rank contrast selection
//! - Interaction column construction
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
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Opaque per-factor state.
pub mod state;

/// Stateful transforms and their registry.
pub mod transforms;

/// Factor protocol, built-in factors, terms and model descriptions.
pub mod factor;

/// Level accumulation and categorical postprocessing.
pub mod categorical;

/// Full-rank contrast selection.
pub mod redundancy;

/// Per-term column construction.
pub mod column_builder;
