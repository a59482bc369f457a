//! Layer 4: Engine
//!
//! # Purpose
//!
//! This layer orchestrates the streaming pipeline:
//! - Validation of evaluated values and configuration
//! - Multi-pass memorization of stateful factors
//! - Type examination with early exit
//! - Per-factor evaluators and the model matrix builder
//! - The executor tying the phases together
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters
//!   ↓
//! Layer 4: Engine ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Validation of values and configuration.
pub mod validator;

/// Memorization orchestrator.
pub mod memorize;

/// Type examiner.
pub mod examine;

/// Numeric and categorical factor evaluators.
pub mod evaluator;

/// Column layout metadata.
pub mod column_info;

/// Model matrix builder and term assembly.
pub mod builder;

/// Three-phase orchestration.
pub mod executor;
