//! Layer 5: Adapters
//!
//! # Purpose
//!
//! This layer provides ready-made restartable chunk sources:
//! - Batch: one in-memory chunk
//! - Streaming: row windows over an in-memory chunk, or a list of chunks
//!
//! Closures returning an iterator of chunks are sources as well.
//!
//! # Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters ← You are here
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Single-chunk source.
pub mod batch;

/// Row-window and chunk-list sources.
pub mod streaming;
