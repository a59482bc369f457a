//! Mixed-radix ("odometer") enumeration of column-index combinations.
//!
//! ## Purpose
//!
//! This module provides the single iterator used to enumerate every
//! combination of per-factor column indices within a term. Both column naming
//! and column value building consume it, which is what guarantees that name
//! order equals column order.
//!
//! ## Design notes
//!
//! * **Lazy**: Combinations are produced on demand.
//! * **Ordering**: The rightmost digit varies fastest; the first factor is the
//!   slowest-varying digit.
//!
//! ## Invariants
//!
//! * The number of combinations is the product of the radices.
//! * An empty radix list yields exactly one (empty) combination.
//! * Any zero radix yields no combinations.
//!
//! ## Non-goals
//!
//! * This module does not know about factors or names.

/// Iterator over all index combinations for a list of radices.
#[derive(Debug, Clone)]
pub struct Odometer {
    radices: Vec<usize>,
    current: Vec<usize>,
    remaining: usize,
}

impl Odometer {
    /// Create an odometer over the given radices.
    pub fn new(radices: &[usize]) -> Self {
        Self {
            radices: radices.to_vec(),
            current: vec![0; radices.len()],
            remaining: radices.iter().product(),
        }
    }

    /// Advance the digits by one, rightmost fastest.
    fn advance(&mut self) {
        for (digit, &radix) in self.current.iter_mut().zip(self.radices.iter()).rev() {
            *digit += 1;
            if *digit < radix {
                return;
            }
            *digit = 0;
        }
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let out = self.current.clone();
        self.remaining -= 1;
        self.advance();
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Odometer {}
