use approx::assert_relative_eq;

use charlton::prelude::*;

fn training_data() -> Chunk<f64> {
    Chunk::new()
        .with("y", Value::numeric(vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 8.0]))
        .with("x", Value::numeric(vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]))
        .with("g", Value::labels(["a", "b", "a", "c", "b", "c", "a"]))
        .with(
            "flag",
            Value::boolean(vec![true, false, true, true, false, false, true]),
        )
}

/// y ~ 1 + g + standardize(x) + g:flag
fn model() -> ModelDesc<f64> {
    let g = LookupFactor::shared("g");
    let flag = LookupFactor::shared("flag");
    ModelDesc::new(
        vec![Term::new(vec![LookupFactor::shared("y")])],
        vec![
            Term::intercept(),
            Term::new(vec![g.clone()]),
            Term::new(vec![TransformFactor::shared("standardize", "x")]),
            Term::new(vec![g, flag]),
        ],
    )
}

// ============================================================================
// Streaming Equivalence
// ============================================================================

#[test]
fn test_streaming_matches_batch() {
    let data = training_data();
    let desc = model();

    let batch_spec = ModelSpecBuilder::new()
        .build_one(&desc, &Batch::new(data.clone()))
        .unwrap();
    let batch = batch_spec.make_matrices(&data).unwrap();

    for chunk_size in 1..=7 {
        let source = Streaming::new(data.clone(), chunk_size).unwrap();
        let spec = ModelSpecBuilder::new().build_one(&desc, &source).unwrap();
        assert_eq!(spec.rhs_column_info(), batch_spec.rhs_column_info());

        let stacked = spec.make_matrices_stacked(&source).unwrap();
        assert_relative_eq!(stacked.rhs, batch.rhs, epsilon = 1e-12);
        assert_relative_eq!(stacked.lhs, batch.lhs, epsilon = 1e-12);
    }
}

#[test]
fn test_incremental_parts_follow_chunks() {
    let data = training_data();
    let source = Streaming::new(data.clone(), 3).unwrap();
    assert_eq!(source.n_windows(), 3);

    let spec = ModelSpecBuilder::new().build_one(&model(), &source).unwrap();
    let parts = spec.make_matrices_incremental(&source).unwrap();
    let rows: Vec<usize> = parts.iter().map(ModelMatrices::nrows).collect();
    assert_eq!(rows, vec![3, 3, 1]);

    let stacked = ModelMatrices::stack(&parts).unwrap();
    assert_eq!(stacked, spec.make_matrices(&data).unwrap());
}

#[test]
fn test_chunk_list_and_closure_sources_agree() {
    let data = training_data();
    let windows: Vec<Chunk<f64>> = (0..7).step_by(2).map(|s| data.slice_rows(s, s + 2)).collect();

    let list: ChunkList<f64> = windows.iter().cloned().collect();
    assert_eq!(list.len(), 4);
    let closure = || windows.clone();

    let from_list = ModelSpecBuilder::new().build_one(&model(), &list).unwrap();
    let from_closure = ModelSpecBuilder::new().build_one(&model(), &closure).unwrap();
    assert_eq!(
        from_list.make_matrices_stacked(&list).unwrap(),
        from_closure.make_matrices_stacked(&closure).unwrap()
    );
}

// ============================================================================
// Column Layout
// ============================================================================

#[test]
fn test_column_names() {
    let data = training_data();
    let spec = ModelSpecBuilder::new()
        .build_one(&model(), &Batch::new(data))
        .unwrap();

    assert_eq!(spec.lhs_column_info().column_names(), &["y"]);
    assert_eq!(
        spec.rhs_column_info().column_names(),
        &[
            "Intercept",
            "g[T.b]",
            "g[T.c]",
            "g[a]:flag[T.true]",
            "g[b]:flag[T.true]",
            "g[c]:flag[T.true]",
            "standardize(x)",
        ]
    );
    assert_eq!(
        spec.rhs_column_info().term_names(),
        &["Intercept", "g", "g:flag", "standardize(x)"]
    );
}

#[test]
fn test_spec_is_deterministic() {
    let data = training_data();
    let source = Streaming::new(data.clone(), 2).unwrap();
    let first = ModelSpecBuilder::new().build_one(&model(), &source).unwrap();
    let second = ModelSpecBuilder::new().build_one(&model(), &source).unwrap();

    assert_eq!(first.rhs_column_info(), second.rhs_column_info());
    assert_eq!(
        first.make_matrices(&data).unwrap(),
        second.make_matrices(&data).unwrap()
    );
}

// ============================================================================
// Scoring New Data
// ============================================================================

#[test]
fn test_scoring_with_level_subset_keeps_layout() {
    let spec = ModelSpecBuilder::new()
        .build_one(&model(), &Batch::new(training_data()))
        .unwrap();

    // Only level "c" appears, and flag is never true
    let new_data: Chunk<f64> = Chunk::new()
        .with("y", Value::numeric(vec![0.0, 0.0]))
        .with("x", Value::numeric(vec![10.0, 11.0]))
        .with("g", Value::labels(["c", "c"]))
        .with("flag", Value::boolean(vec![false, false]));
    let matrices = spec.make_matrices(&new_data).unwrap();

    assert_eq!(matrices.rhs.ncols(), 7);
    assert_eq!(matrices.rhs[(0, 0)], 1.0);
    assert_eq!(matrices.rhs[(0, 1)], 0.0);
    assert_eq!(matrices.rhs[(0, 2)], 1.0);
    assert_eq!(matrices.rhs[(1, 5)], 0.0);
}

#[test]
fn test_scoring_unseen_label_fails() {
    let spec = ModelSpecBuilder::new()
        .build_one(&model(), &Batch::new(training_data()))
        .unwrap();

    let new_data: Chunk<f64> = Chunk::new()
        .with("y", Value::numeric(vec![0.0]))
        .with("x", Value::numeric(vec![1.0]))
        .with("g", Value::labels(["d"]))
        .with("flag", Value::boolean(vec![true]));
    match spec.make_matrices(&new_data) {
        Err(ModelError::LevelMismatch { factor, .. }) => assert_eq!(factor, "g"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_scoring_missing_variable_fails() {
    let spec = ModelSpecBuilder::new()
        .build_one(&model(), &Batch::new(training_data()))
        .unwrap();

    let new_data: Chunk<f64> = Chunk::new().with("y", Value::numeric(vec![0.0]));
    assert!(matches!(
        spec.make_matrices(&new_data),
        Err(ModelError::UnknownVariable(_))
    ));
}

// ============================================================================
// Stateful Transforms
// ============================================================================

#[test]
fn test_standardize_column_is_zero_mean_unit_variance() {
    let data = training_data();
    let source = Streaming::new(data.clone(), 3).unwrap();
    let spec = ModelSpecBuilder::new().build_one(&model(), &source).unwrap();
    let rhs = spec.make_matrices_stacked(&source).unwrap().rhs;

    let col = spec
        .rhs_column_info()
        .column_index("standardize(x)")
        .unwrap();
    let values: Vec<f64> = rhs.column(col).iter().copied().collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
    assert_relative_eq!(var, 1.0, epsilon = 1e-12);
}

#[test]
fn test_center_uses_training_mean_when_scoring() {
    let data: Chunk<f64> = Chunk::new().with("x", Value::numeric(vec![1.0, 2.0, 3.0, 6.0]));
    let desc = ModelDesc::new(
        vec![],
        vec![Term::new(vec![TransformFactor::shared("center", "x")])],
    );
    let spec = ModelSpecBuilder::new()
        .build_one(&desc, &Streaming::new(data, 1).unwrap())
        .unwrap();

    // Training mean is 3
    let scoring: Chunk<f64> = Chunk::new().with("x", Value::numeric(vec![3.0, 10.0]));
    let rhs = spec.make_matrices(&scoring).unwrap().rhs;
    assert_relative_eq!(rhs[(0, 0)], 0.0);
    assert_relative_eq!(rhs[(1, 0)], 7.0);
}

#[derive(Debug, Default)]
struct AddOne;

impl StatefulTransform<f64> for AddOne {
    fn passes_needed(&self) -> usize {
        0
    }

    fn memorize_chunk(&mut self, _which_pass: usize, _values: &RawArray<f64>) -> Result<(), ModelError> {
        Ok(())
    }

    fn memorize_finish(&mut self, _which_pass: usize) -> Result<(), ModelError> {
        Ok(())
    }

    fn transform(&self, values: &RawArray<f64>) -> Result<RawArray<f64>, ModelError> {
        Ok(values.map(|v| v + 1.0))
    }
}

fn make_add_one() -> Box<dyn StatefulTransform<f64>> {
    Box::new(AddOne)
}

#[test]
fn test_custom_transform_registry() {
    let mut registry = TransformRegistry::empty();
    registry.register("add_one", make_add_one);

    let data: Chunk<f64> = Chunk::new().with("x", Value::numeric(vec![1.0, 2.0]));
    let desc = ModelDesc::new(
        vec![],
        vec![Term::new(vec![TransformFactor::shared("add_one", "x")])],
    );
    let spec = ModelSpecBuilder::new()
        .stateful_transforms(registry)
        .build_one(&desc, &Batch::new(data.clone()))
        .unwrap();
    assert_eq!(spec.rhs_column_info().column_names(), &["add_one(x)"]);
    assert_eq!(spec.make_matrices(&data).unwrap().rhs.as_slice(), &[2.0, 3.0]);

    // Builtins are absent from a custom registry
    let desc = ModelDesc::new(
        vec![],
        vec![Term::new(vec![TransformFactor::shared("center", "x")])],
    );
    let result = ModelSpecBuilder::new()
        .stateful_transforms(TransformRegistry::empty())
        .build_one(&desc, &Batch::new(data));
    assert!(matches!(result, Err(ModelError::UnknownTransform(_))));
}

// ============================================================================
// Builder Configuration
// ============================================================================

#[test]
fn test_default_env_supplies_constants() {
    let data: Chunk<f64> = Chunk::new().with("x", Value::numeric(vec![1.0, 2.0, 3.0]));
    let defaults: Chunk<f64> = Chunk::new().with("g", Value::labels(["a", "a", "b"]));
    let desc = ModelDesc::new(
        vec![],
        vec![Term::intercept(), Term::new(vec![LookupFactor::shared("g")])],
    );
    let spec = ModelSpecBuilder::new()
        .default_env(defaults)
        .build_one(&desc, &Batch::new(data.clone()))
        .unwrap();
    assert_eq!(spec.rhs_column_info().column_names(), &["Intercept", "g[T.b]"]);
    assert_eq!(spec.make_matrices(&data).unwrap().rhs.column(1).as_slice(), &[0.0, 0.0, 1.0]);
}

#[test]
fn test_duplicate_parameter_rejected() {
    let result = ModelSpecBuilder::<f64>::new()
        .default_env(Chunk::new())
        .default_env(Chunk::new())
        .build_one(&model(), &Batch::new(training_data()));
    assert!(matches!(
        result,
        Err(ModelError::DuplicateParameter {
            parameter: "default_env"
        })
    ));
}

#[test]
fn test_shared_factors_across_descriptions() {
    let data = training_data();
    let other = ModelDesc::new(
        vec![],
        vec![Term::new(vec![LookupFactor::shared("g")])],
    );
    let specs = ModelSpecBuilder::new()
        .build(&[model(), other], &Streaming::new(data.clone(), 4).unwrap())
        .unwrap();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[1].rhs_column_info().column_names(), &["g[a]", "g[b]", "g[c]"]);
    assert_eq!(specs[1].lhs_column_info().n_columns(), 0);

    let matrices = specs[1].make_matrices(&data).unwrap();
    assert_eq!(matrices.lhs.shape(), (7, 0));
    assert_eq!(matrices.rhs.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_invalid_chunk_size() {
    let result = Streaming::new(training_data(), 0);
    assert!(matches!(
        result,
        Err(ModelError::InvalidChunkSize { got: 0, min: 1 })
    ));
}

#[test]
fn test_empty_source_fails_to_classify() {
    let empty: ChunkList<f64> = ChunkList::new(Vec::new());
    let result = ModelSpecBuilder::new().build_one(&model(), &empty);
    assert!(matches!(result, Err(ModelError::Unclassified { .. })));
}
