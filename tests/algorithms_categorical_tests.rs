use charlton::internals::algorithms::categorical::{LevelAccumulator, Postprocessor};
use charlton::internals::primitives::categorical::Categorical;
use charlton::internals::primitives::errors::ModelError;
use charlton::internals::primitives::value::{Level, RawArray, Value};

fn levels(names: &[&str]) -> Vec<Level> {
    names.iter().map(|&n| Level::from(n)).collect()
}

// ============================================================================
// Level Discovery
// ============================================================================

#[test]
fn test_level_accumulator_across_chunks() {
    let mut acc = LevelAccumulator::new();
    assert!(acc.is_empty());

    acc.add(&RawArray::from_vec(levels(&["c", "a"])));
    acc.add(&RawArray::from_vec(levels(&["a", "b", "c"])));
    assert_eq!(acc.len(), 3);

    // Sorted and deduplicated
    assert_eq!(acc.finish(), levels(&["a", "b", "c"]));
}

#[test]
fn test_level_accumulator_integer_levels_sort_numerically() {
    let mut acc = LevelAccumulator::new();
    acc.add(&RawArray::from_vec(vec![Level::from(10), Level::from(2), Level::from(1)]));
    assert_eq!(
        acc.finish(),
        vec![Level::from(1), Level::from(2), Level::from(10)]
    );
}

// ============================================================================
// Postprocessing
// ============================================================================

#[test]
fn test_bool_to_categorical() {
    let value: Value<f64> = Value::boolean(vec![true, false, true]);
    let cat = Postprocessor::BoolToCategorical.transform("flag", value).unwrap();
    assert_eq!(cat.levels(), &[Level::Bool(false), Level::Bool(true)]);
    assert_eq!(cat.codes().data(), &[1, 0, 1]);
}

#[test]
fn test_labels_coded_against_frozen_levels() {
    let post = Postprocessor::Levels(levels(&["a", "b", "c"]));

    // A chunk that only contains a subset of the levels
    let value: Value<f64> = Value::labels(["c", "c"]);
    let cat = post.transform("g", value).unwrap();
    assert_eq!(cat.levels(), levels(&["a", "b", "c"]).as_slice());
    assert_eq!(cat.codes().data(), &[2, 2]);
}

#[test]
fn test_unseen_label_is_level_mismatch() {
    let post = Postprocessor::Levels(levels(&["a", "b"]));
    let value: Value<f64> = Value::labels(["a", "z"]);
    match post.transform("g", value) {
        Err(ModelError::LevelMismatch {
            factor,
            expected,
            found,
        }) => {
            assert_eq!(factor, "g");
            assert_eq!(expected, levels(&["a", "b"]));
            assert_eq!(found, levels(&["a", "b", "z"]));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_categorical_passes_through() {
    let cat = Categorical::from_labels(["x", "y"]);
    let value: Value<f64> = Value::Categorical(cat.clone());
    let out = Postprocessor::Levels(levels(&["a"])).transform("g", value).unwrap();
    assert_eq!(out, cat);
}

#[test]
fn test_postprocessor_rejects_wrong_input() {
    // Numeric into a label postprocessor
    let value: Value<f64> = Value::numeric(vec![1.0]);
    let result = Postprocessor::Levels(levels(&["a"])).transform("g", value);
    assert!(matches!(
        result,
        Err(ModelError::TypeMismatch {
            expected: "label",
            found: "numeric",
            ..
        })
    ));

    // Matrix of labels
    let labels = RawArray::from_shape_vec(vec![1, 2], levels(&["a", "a"])).unwrap();
    let result = Postprocessor::Levels(levels(&["a"])).transform("g", Value::<f64>::Labels(labels));
    assert!(matches!(
        result,
        Err(ModelError::TooManyDimensions { ndim: 2, max: 1, .. })
    ));
}
