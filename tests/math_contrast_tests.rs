use approx::assert_relative_eq;
use nalgebra::DMatrix;

use charlton::internals::math::contrast::{code_contrast_matrix, Contrast, ContrastMatrix};
use charlton::internals::primitives::errors::ModelError;
use charlton::internals::primitives::value::Level;

fn levels(names: &[&str]) -> Vec<Level> {
    names.iter().map(|&n| Level::from(n)).collect()
}

// ============================================================================
// Treatment
// ============================================================================

#[test]
fn test_treatment_reduced_drops_first_level() {
    let coded: ContrastMatrix<f64> =
        code_contrast_matrix(false, &levels(&["a", "b", "c"]), None).unwrap();
    assert_eq!(coded.column_suffixes(), &["[T.b]", "[T.c]"]);
    let expected = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert_eq!(coded.matrix(), &expected);
}

#[test]
fn test_treatment_full_is_identity() {
    let coded: ContrastMatrix<f64> =
        code_contrast_matrix(true, &levels(&["a", "b", "c"]), None).unwrap();
    assert_eq!(coded.column_suffixes(), &["[a]", "[b]", "[c]"]);
    assert_eq!(coded.matrix(), &DMatrix::identity(3, 3));
}

#[test]
fn test_treatment_reference_level() {
    let contrast = Contrast::Treatment { reference: Some(1) };
    let coded: ContrastMatrix<f64> = contrast
        .code_without_intercept(&levels(&["a", "b", "c"]))
        .unwrap();
    assert_eq!(coded.column_suffixes(), &["[T.a]", "[T.c]"]);
    assert_eq!(coded.matrix()[(0, 0)], 1.0);
    assert_eq!(coded.matrix()[(1, 0)], 0.0);
    assert_eq!(coded.matrix()[(1, 1)], 0.0);
    assert_eq!(coded.matrix()[(2, 1)], 1.0);

    // Reference out of range
    let bad = Contrast::Treatment { reference: Some(5) };
    let result: Result<ContrastMatrix<f64>, _> = bad.code_without_intercept(&levels(&["a", "b"]));
    assert!(matches!(result, Err(ModelError::InvalidContrast(_))));
}

#[test]
fn test_single_level_reduced_has_no_columns() {
    let coded: ContrastMatrix<f64> = code_contrast_matrix(false, &levels(&["only"]), None).unwrap();
    assert_eq!(coded.ncols(), 0);
    assert_eq!(coded.matrix().nrows(), 1);
}

// ============================================================================
// Sum
// ============================================================================

#[test]
fn test_sum_reduced_omits_last_level() {
    let contrast = Contrast::Sum { omit: None };
    let coded: ContrastMatrix<f64> = contrast
        .code_without_intercept(&levels(&["a", "b", "c"]))
        .unwrap();
    assert_eq!(coded.column_suffixes(), &["[S.a]", "[S.b]"]);
    let expected = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, -1.0, -1.0]);
    assert_eq!(coded.matrix(), &expected);

    // Every column sums to zero
    for col in coded.matrix().column_iter() {
        assert_relative_eq!(col.sum(), 0.0);
    }
}

#[test]
fn test_sum_full_prepends_mean_column() {
    let contrast = Contrast::Sum { omit: Some(0) };
    let coded: ContrastMatrix<f64> = contrast
        .code_with_intercept(&levels(&["a", "b", "c"]))
        .unwrap();
    assert_eq!(coded.column_suffixes(), &["[mean]", "[S.b]", "[S.c]"]);
    let expected = DMatrix::from_row_slice(
        3,
        3,
        &[1.0, -1.0, -1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0],
    );
    assert_eq!(coded.matrix(), &expected);
}

// ============================================================================
// Custom
// ============================================================================

#[test]
fn test_custom_contrast() {
    let matrix = DMatrix::from_row_slice(2, 1, &[-0.5, 0.5]);
    let custom = ContrastMatrix::new(matrix, vec![".diff".to_string()]).unwrap();
    let contrast = Contrast::Custom(custom);

    // Used for both codings
    let reduced: ContrastMatrix<f32> = contrast.code_without_intercept(&levels(&["lo", "hi"])).unwrap();
    let full: ContrastMatrix<f32> = contrast.code_with_intercept(&levels(&["lo", "hi"])).unwrap();
    assert_eq!(reduced, full);
    assert_relative_eq!(reduced.matrix()[(1, 0)], 0.5f32);
    assert_eq!(reduced.column_suffixes(), &[".diff"]);

    // Row count must match the level count
    let result: Result<ContrastMatrix<f64>, _> = contrast.code_with_intercept(&levels(&["a", "b", "c"]));
    assert!(matches!(result, Err(ModelError::InvalidContrast(_))));
}

#[test]
fn test_contrast_matrix_suffix_count() {
    let matrix = DMatrix::<f64>::zeros(3, 2);
    let result = ContrastMatrix::new(matrix, vec!["[x]".to_string()]);
    assert!(matches!(result, Err(ModelError::InvalidContrast(_))));
}
