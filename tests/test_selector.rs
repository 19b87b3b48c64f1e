use treesum::{
    compute_centroid, compute_derived_points, euclidean_distance, select_representative,
    select_representative_labeled, InvalidInputError, ShapeIndices,
};

fn sample(pairs: &[(f64, f64)]) -> Vec<ShapeIndices> {
    pairs.iter().map(|&(l, b)| ShapeIndices::new(l, b)).collect()
}

// --- TESTS DERIVED POINTS AND CENTROID ---
#[test]
fn test_derived_points_preserve_order() {
    let s = sample(&[(0.9, 0.05), (0.1, 0.8), (0.3, 0.3)]);
    let points = compute_derived_points(&s).unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[1].linearity, 0.1);
    assert_eq!(points[1].branching, 0.8);
    for p in &points {
        assert!((p.coords().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_centroid_is_mean() {
    let s = sample(&[(1.0, 0.0), (0.0, 1.0), (0.5, 0.5)]);
    let points = compute_derived_points(&s).unwrap();
    let centroid = compute_centroid(&points).unwrap();
    assert!((centroid.linearity - 0.5).abs() < 1e-12);
    assert!((centroid.branching - 0.5).abs() < 1e-12);
    assert!(centroid.cocluster.abs() < 1e-12);
}

// --- TESTS SELECTION ---
#[test]
fn test_selection_is_idempotent() {
    let s = sample(&[(0.2, 0.3), (0.6, 0.1), (0.25, 0.35), (0.8, 0.2)]);
    let first = select_representative(&s).unwrap();
    let second = select_representative(&s).unwrap();
    assert_eq!(first, second);

    // Selected point is no farther from the centroid than any other
    let best = euclidean_distance(&first.points[first.index], &first.centroid);
    for p in &first.points {
        assert!(best <= euclidean_distance(p, &first.centroid));
    }
}

#[test]
fn test_equidistant_points_pick_first() {
    let s = sample(&[(1.0, 0.0), (0.0, 1.0)]);
    let result = select_representative(&s).unwrap();
    assert_eq!(result.index, 0);
}

#[test]
fn test_labeled_requires_aligned_ids() {
    let s = sample(&[(0.5, 0.25), (0.5, 0.25)]);
    let ids = vec!["a".to_string(), "b".to_string()];
    let (result, id) = select_representative_labeled(&s, &ids).unwrap();
    assert_eq!(result.index, 0);
    assert_eq!(id, "a");

    let err = select_representative_labeled(&s, &ids[..1]).unwrap_err();
    assert_eq!(err, InvalidInputError::LengthMismatch { expected: 2, actual: 1 });
}

#[test]
fn test_invalid_samples() {
    assert_eq!(select_representative(&[]).unwrap_err(), InvalidInputError::EmptySample);
    assert!(select_representative(&sample(&[(f64::NAN, 0.2)])).is_err());
    assert!(select_representative(&sample(&[(0.2, f64::NEG_INFINITY)])).is_err());
    assert_eq!(
        InvalidInputError::EmptySample.to_string(),
        "Sample is empty, at least one item is required"
    );
}
