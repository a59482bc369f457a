use std::collections::BTreeMap;

use charlton::internals::algorithms::redundancy::{
    pick_contrasts_for_term, subsets_sorted, SubtermCoding, UsedSubterms, MAX_TERM_CATEGORICALS,
};
use charlton::internals::primitives::errors::ModelError;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn coding(pairs: &[(&str, bool)]) -> SubtermCoding {
    pairs
        .iter()
        .map(|&(name, full)| (name.to_string(), full))
        .collect::<BTreeMap<_, _>>()
}

// ============================================================================
// Subset Enumeration
// ============================================================================

#[test]
fn test_subsets_sorted_by_size_then_position() {
    assert_eq!(
        subsets_sorted(3).unwrap(),
        vec![
            vec![],
            vec![0],
            vec![1],
            vec![2],
            vec![0, 1],
            vec![0, 2],
            vec![1, 2],
            vec![0, 1, 2],
        ]
    );
    assert_eq!(subsets_sorted(0).unwrap(), vec![Vec::<usize>::new()]);
}

#[test]
fn test_subsets_reject_oversized_terms() {
    assert!(matches!(
        subsets_sorted(MAX_TERM_CATEGORICALS + 1),
        Err(ModelError::InvalidInput(_))
    ));

    let wide: Vec<String> = (0..64).map(|i| format!("f{}", i)).collect();
    let mut used = UsedSubterms::new();
    assert!(matches!(
        pick_contrasts_for_term(&wide, &mut used),
        Err(ModelError::InvalidInput(_))
    ));
    assert!(used.is_empty());
}

// ============================================================================
// Contrast Picking
// ============================================================================

#[test]
fn test_intercept_then_main_effect_is_reduced() {
    let mut used = UsedSubterms::new();

    // 1
    assert_eq!(pick_contrasts_for_term(&[], &mut used).unwrap(), vec![coding(&[])]);
    // a: the empty subterm is already covered
    assert_eq!(
        pick_contrasts_for_term(&names(&["a"]), &mut used).unwrap(),
        vec![coding(&[("a", false)])]
    );
}

#[test]
fn test_main_effect_without_intercept_is_full() {
    let mut used = UsedSubterms::new();
    assert_eq!(
        pick_contrasts_for_term(&names(&["a"]), &mut used).unwrap(),
        vec![coding(&[("a", true)])]
    );
}

#[test]
fn test_interaction_without_lower_terms() {
    // 0 + a:b
    let mut used = UsedSubterms::new();
    assert_eq!(
        pick_contrasts_for_term(&names(&["a", "b"]), &mut used).unwrap(),
        vec![coding(&[("a", true), ("b", true)])]
    );
}

#[test]
fn test_full_factorial_with_intercept() {
    // 1 + a + b + a:b
    let mut used = UsedSubterms::new();
    pick_contrasts_for_term(&[], &mut used).unwrap();
    pick_contrasts_for_term(&names(&["a"]), &mut used).unwrap();
    pick_contrasts_for_term(&names(&["b"]), &mut used).unwrap();
    assert_eq!(
        pick_contrasts_for_term(&names(&["a", "b"]), &mut used).unwrap(),
        vec![coding(&[("a", false), ("b", false)])]
    );
}

#[test]
fn test_interaction_with_one_main_effect() {
    // 1 + a + a:b: b is nested within a, so a is coded full inside a:b
    let mut used = UsedSubterms::new();
    pick_contrasts_for_term(&[], &mut used).unwrap();
    pick_contrasts_for_term(&names(&["a"]), &mut used).unwrap();
    assert_eq!(
        pick_contrasts_for_term(&names(&["a", "b"]), &mut used).unwrap(),
        vec![coding(&[("a", true), ("b", false)])]
    );
}

#[test]
fn test_used_set_grows_with_every_subterm() {
    let mut used = UsedSubterms::new();
    pick_contrasts_for_term(&names(&["a", "b"]), &mut used).unwrap();
    // {}, {a}, {b}, {a, b}
    assert_eq!(used.len(), 4);

    // Everything is covered: a repeated term contributes nothing
    assert!(pick_contrasts_for_term(&names(&["a", "b"]), &mut used).unwrap().is_empty());
}
