//! Full-rank contrast selection across terms.
//!
//! ## Purpose
//!
//! This module decides, for every term, which categorical factors are coded
//! with full-rank contrasts and which with reduced contrasts, so that the
//! assembled model matrix has no columns that are exact linear combinations of
//! columns from lower-order terms.
//!
//! ## Design notes
//!
//! * **Subterms**: A term is expanded into the subsets of its categorical
//!   factors that no earlier term in the same bucket has already covered.
//! * **Absorption**: A subterm one factor larger than, and a superset of, an
//!   earlier subterm absorbs it; the extra factor is then coded full rank.
//!   Absorption runs greedily from the left until nothing changes.
//! * **Buckets**: Callers keep one used-subterm set per set of numeric factors;
//!   numeric factors never influence the choice.
//!
//! ## Key concepts
//!
//! * **Reduced** coding drops the intercept direction of a factor.
//! * **Full** coding spans it.
//!
//! ## Invariants
//!
//! * The used set records subterms with every factor reduced.
//! * Subsets are enumerated by size, then by factor position.
//! * A term holds at most [`MAX_TERM_CATEGORICALS`] categorical factors.
//!
//! ## Non-goals
//!
//! * This module does not compute contrast matrices.

// External dependencies
use std::collections::{BTreeMap, BTreeSet};

// Internal dependencies
use crate::primitives::errors::ModelError;

/// Categorical factors a bucket has already covered, each set fully reduced.
pub type UsedSubterms = BTreeSet<BTreeSet<String>>;

/// Per-factor coding of one subterm: `true` for full rank, `false` for reduced.
pub type SubtermCoding = BTreeMap<String, bool>;

/// An expanded subterm: categorical factor names with their full-rank flag.
type Subterm = BTreeSet<(String, bool)>;

// ============================================================================
// Subset Enumeration
// ============================================================================

/// Largest number of categorical factors a single term may contain.
pub const MAX_TERM_CATEGORICALS: usize = u64::BITS as usize - 1;

/// All subsets of `0..n`, ordered by size then lexicographically by index.
pub fn subsets_sorted(n: usize) -> Result<Vec<Vec<usize>>, ModelError> {
    if n > MAX_TERM_CATEGORICALS {
        return Err(ModelError::InvalidInput(format!(
            "a term with {} categorical factors exceeds the limit of {}",
            n, MAX_TERM_CATEGORICALS
        )));
    }
    let mut subsets: Vec<Vec<usize>> = (0u64..(1u64 << n))
        .map(|mask| (0..n).filter(|i| mask & (1 << i) != 0).collect())
        .collect();
    subsets.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    Ok(subsets)
}

// ============================================================================
// Contrast Picking
// ============================================================================

/// Choose subterm codings for one term's categorical factors.
///
/// `categorical` lists the term's categorical factors in term order. `used`
/// is the bucket's used-subterm set and is updated in place. Each returned
/// coding becomes one column builder; an empty coding covers the numeric
/// factors alone (or the intercept).
pub fn pick_contrasts_for_term(
    categorical: &[String],
    used: &mut UsedSubterms,
) -> Result<Vec<SubtermCoding>, ModelError> {
    let mut subterms: Vec<Subterm> = Vec::new();
    let mut fresh: Vec<BTreeSet<String>> = Vec::new();

    for subset in subsets_sorted(categorical.len())? {
        let names: BTreeSet<String> = subset.iter().map(|&i| categorical[i].clone()).collect();
        if used.contains(&names) {
            continue;
        }
        subterms.push(names.iter().map(|n| (n.clone(), false)).collect());
        fresh.push(names);
    }
    used.extend(fresh);

    while simplify_one(&mut subterms) {}

    Ok(subterms
        .into_iter()
        .map(|subterm| subterm.into_iter().collect())
        .collect())
}

/// Apply the first available absorption; returns whether one happened.
fn simplify_one(subterms: &mut Vec<Subterm>) -> bool {
    for short_i in 0..subterms.len() {
        for long_i in short_i + 1..subterms.len() {
            if let Some(merged) = absorb(&subterms[long_i], &subterms[short_i]) {
                subterms[long_i] = merged;
                subterms.remove(short_i);
                return true;
            }
        }
    }
    false
}

fn absorb(long: &Subterm, short: &Subterm) -> Option<Subterm> {
    if long.len() != short.len() + 1 || !long.is_superset(short) {
        return None;
    }
    let extra = long.difference(short).next()?;
    let mut merged = short.clone();
    merged.insert((extra.0.clone(), true));
    Some(merged)
}
