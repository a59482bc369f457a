mod common;

use std::cell::Cell;

use charlton::internals::algorithms::factor::{FactorRef, TransformFactor};
use charlton::internals::algorithms::state::StateEntry;
use charlton::internals::algorithms::transforms::TransformRegistry;
use charlton::internals::engine::memorize::{freeze_states, memorize_factors};
use charlton::internals::primitives::chunk::Chunk;
use charlton::internals::primitives::errors::ModelError;
use charlton::internals::primitives::value::Value;

use common::{call_log, windows, MockFactor};

fn data() -> Chunk<f64> {
    Chunk::new().with("x", Value::numeric(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
}

// ============================================================================
// Pass Scheduling
// ============================================================================

#[test]
fn test_each_factor_gets_exactly_its_passes() {
    let chunks = windows(&data(), 2);
    let source = || chunks.clone();

    let factors: Vec<FactorRef<f64>> = vec![
        MockFactor::new("none", 0).shared(),
        MockFactor::new("one", 1).shared(),
        MockFactor::new("three", 3).shared(),
    ];
    let states = memorize_factors(
        &factors,
        &TransformRegistry::default(),
        &Chunk::new(),
        &source,
    )
    .unwrap();
    assert_eq!(states.len(), 3);

    // Zero-pass factors are asked once and never fed
    let none = &states["none"];
    assert_eq!(none.count("passes_needed"), 1);
    assert_eq!(none.count("chunk:0"), 0);
    assert_eq!(call_log(none), "");

    // Three chunks per pass, then the pass is finished
    let one = &states["one"];
    assert_eq!(one.count("chunk:0"), 3);
    assert_eq!(one.count("finish:0"), 1);
    assert_eq!(one.count("chunk:1"), 0);
    assert_eq!(call_log(one), "c0 c0 c0 f0");

    let three = &states["three"];
    assert_eq!(
        call_log(three),
        "c0 c0 c0 f0 c1 c1 c1 f1 c2 c2 c2 f2"
    );
    assert_eq!(three.count("finish:2"), 1);
    assert_eq!(three.count("chunk:3"), 0);
}

#[test]
fn test_stream_restarts_once_per_pass() {
    let chunks = windows(&data(), 2);
    let restarts = Cell::new(0);
    let source = || {
        restarts.set(restarts.get() + 1);
        chunks.clone()
    };

    let factors: Vec<FactorRef<f64>> = vec![
        MockFactor::new("a", 2).shared(),
        MockFactor::new("b", 1).shared(),
    ];
    memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source).unwrap();

    // Passes needed by the slowest factor
    assert_eq!(restarts.get(), 2);
}

#[test]
fn test_no_stateful_factors_reads_nothing() {
    let restarts = Cell::new(0);
    let source = || {
        restarts.set(restarts.get() + 1);
        Vec::<Chunk<f64>>::new()
    };

    let factors: Vec<FactorRef<f64>> = vec![MockFactor::new("a", 0).shared()];
    let states =
        memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source).unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(restarts.get(), 0);
}

#[test]
fn test_shared_factor_memorized_once() {
    let chunks = windows(&data(), 5);
    let source = || chunks.clone();

    let shared = MockFactor::new("x", 1).shared();
    let factors = vec![shared.clone(), shared];
    let states =
        memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source).unwrap();

    assert_eq!(states.len(), 1);
    assert_eq!(states["x"].count("chunk:0"), 1);
    assert_eq!(states["x"].count("passes_needed"), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_non_restartable_source_is_detected() {
    let chunks = windows(&data(), 2);
    let restarts = Cell::new(0);
    let source = || {
        restarts.set(restarts.get() + 1);
        if restarts.get() == 1 {
            chunks.clone()
        } else {
            Vec::new()
        }
    };

    let factors: Vec<FactorRef<f64>> = vec![MockFactor::new("twice", 2).shared()];
    let result = memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source);
    match result {
        Err(ModelError::IncompleteMemorization { factor, .. }) => assert_eq!(factor, "twice"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_unknown_transform_fails_before_reading() {
    let restarts = Cell::new(0);
    let source = || {
        restarts.set(restarts.get() + 1);
        vec![data()]
    };

    let factors: Vec<FactorRef<f64>> = vec![TransformFactor::shared("scale", "x")];
    let result = memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source);
    assert!(matches!(result, Err(ModelError::UnknownTransform(_))));
    assert_eq!(restarts.get(), 0);
}

#[test]
fn test_transform_factor_state_is_frozen() {
    let chunks = windows(&data(), 2);
    let source = || chunks.clone();

    let factors: Vec<FactorRef<f64>> = vec![TransformFactor::shared("center", "x")];
    let states =
        memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source).unwrap();
    let frozen = freeze_states(states);

    let state = &frozen["center(x)"];
    assert!(matches!(state.get("transform"), Some(StateEntry::Transform(_))));
    assert!(state.transform("transform").is_some());
}

#[test]
fn test_defaults_are_visible_during_memorization() {
    // The chunks do not carry x; the default environment does
    let chunks = vec![Chunk::new().with("y", Value::numeric(vec![0.0]))];
    let source = || chunks.clone();
    let defaults = data();

    let factors: Vec<FactorRef<f64>> = vec![TransformFactor::shared("center", "x")];
    let states = memorize_factors(&factors, &TransformRegistry::default(), &defaults, &source);
    assert!(states.is_ok());

    // Without defaults the variable is unknown
    let result = memorize_factors(&factors, &TransformRegistry::default(), &Chunk::new(), &source);
    match result {
        Err(ModelError::UnboundVariable { factor, variable }) => {
            assert_eq!(factor, "center(x)");
            assert_eq!(variable, "x");
        }
        other => panic!("unexpected: {:?}", other),
    }
}
