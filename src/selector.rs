//! Representative tree selection.
//!
//! Each tree is described by its linearity and branching index. Adding the
//! cocluster index `1 - (linearity + branching)` turns every tree into a point
//! in a three-way decomposition; the representative is the point closest to
//! the mean of all points.

use crate::error::InvalidInputError;
use serde::{Deserialize, Serialize};

/// One sample item: the shape indices of a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeIndices {
    pub linearity_index: f64,
    pub branching_index: f64,
}

impl ShapeIndices {
    pub fn new(linearity_index: f64, branching_index: f64) -> Self {
        ShapeIndices { linearity_index, branching_index }
    }
}

/// A tree's position in (linearity, branching, cocluster) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedPoint {
    pub linearity: f64,
    pub branching: f64,
    pub cocluster: f64,
}

impl DerivedPoint {
    pub fn coords(&self) -> [f64; 3] {
        [self.linearity, self.branching, self.cocluster]
    }
}

impl From<ShapeIndices> for DerivedPoint {
    fn from(s: ShapeIndices) -> Self {
        DerivedPoint {
            linearity: s.linearity_index,
            branching: s.branching_index,
            cocluster: 1.0 - (s.linearity_index + s.branching_index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    /// Index into the sample of the point nearest the centroid
    pub index: usize,
    pub centroid: DerivedPoint,
    pub points: Vec<DerivedPoint>,
}

/// Derive the three-way coordinates of every sample item, in order.
pub fn compute_derived_points(sample: &[ShapeIndices]) -> Result<Vec<DerivedPoint>, InvalidInputError> {
    if sample.is_empty() {
        return Err(InvalidInputError::EmptySample);
    }

    for (index, s) in sample.iter().enumerate() {
        if !s.linearity_index.is_finite() {
            return Err(InvalidInputError::NonFinite {
                index,
                field: "linearity_index",
                value: s.linearity_index,
            });
        }
        if !s.branching_index.is_finite() {
            return Err(InvalidInputError::NonFinite {
                index,
                field: "branching_index",
                value: s.branching_index,
            });
        }
    }

    let points: Vec<DerivedPoint> = sample.iter().map(|&s| DerivedPoint::from(s)).collect();

    // Finite indices can still overflow when summed
    if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.cocluster.is_finite()) {
        return Err(InvalidInputError::NonFinite {
            index,
            field: "cocluster_index",
            value: p.cocluster,
        });
    }

    Ok(points)
}

/// Element-wise mean of the points.
pub fn compute_centroid(points: &[DerivedPoint]) -> Result<DerivedPoint, InvalidInputError> {
    if points.is_empty() {
        return Err(InvalidInputError::EmptySample);
    }

    let mut sum = [0.0f64; 3];
    for p in points {
        for (acc, v) in sum.iter_mut().zip(p.coords()) {
            *acc += v;
        }
    }

    let n = points.len() as f64;
    Ok(DerivedPoint {
        linearity: sum[0] / n,
        branching: sum[1] / n,
        cocluster: sum[2] / n,
    })
}

pub fn euclidean_distance(a: &DerivedPoint, b: &DerivedPoint) -> f64 {
    a.coords()
        .iter()
        .zip(b.coords())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Pick the sample item whose derived point lies nearest the centroid.
///
/// Ties go to the lowest index.
pub fn select_representative(sample: &[ShapeIndices]) -> Result<SelectionResult, InvalidInputError> {
    let points = compute_derived_points(sample)?;
    let centroid = compute_centroid(&points)?;

    let mut best = 0;
    let mut min_dist = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let dist = euclidean_distance(p, &centroid);
        if dist < min_dist {
            min_dist = dist;
            best = i;
        }
    }

    Ok(SelectionResult { index: best, centroid, points })
}

/// Like [`select_representative`], also returning the identifier of the
/// selected item. `ids` must be index-aligned with `sample`.
pub fn select_representative_labeled<'a, T>(
    sample: &[ShapeIndices],
    ids: &'a [T],
) -> Result<(SelectionResult, &'a T), InvalidInputError> {
    if ids.len() != sample.len() {
        return Err(InvalidInputError::LengthMismatch {
            expected: sample.len(),
            actual: ids.len(),
        });
    }

    let result = select_representative(sample)?;
    let id = &ids[result.index];
    Ok((result, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn s(l: f64, b: f64) -> ShapeIndices {
        ShapeIndices::new(l, b)
    }

    #[test]
    fn test_derived_points_sum_to_one() {
        let sample = vec![s(0.1, 0.2), s(0.7, 0.05), s(0.0, 0.0), s(0.33, 0.33)];
        let points = compute_derived_points(&sample).unwrap();
        assert_eq!(points.len(), sample.len());
        for (p, item) in points.iter().zip(&sample) {
            assert_eq!(p.linearity, item.linearity_index);
            assert_eq!(p.branching, item.branching_index);
            assert!((p.linearity + p.branching + p.cocluster - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_centroid_of_identical_points() {
        let sample = vec![s(0.5, 0.25); 5];
        let points = compute_derived_points(&sample).unwrap();
        let centroid = compute_centroid(&points).unwrap();
        assert_eq!(centroid, points[0]);
    }

    #[test]
    fn test_centroid_empty() {
        assert_eq!(compute_centroid(&[]), Err(InvalidInputError::EmptySample));
    }

    #[test]
    fn test_distance_symmetric() {
        let a = DerivedPoint::from(s(0.2, 0.3));
        let b = DerivedPoint::from(s(0.9, 0.0));
        assert_eq!(euclidean_distance(&a, &a), 0.0);
        assert_eq!(euclidean_distance(&a, &b), euclidean_distance(&b, &a));
        assert!(euclidean_distance(&a, &b) > 0.0);
    }

    #[test]
    fn test_single_item_selects_zero() {
        let result = select_representative(&[s(0.8, 0.1)]).unwrap();
        assert_eq!(result.index, 0);
        assert_eq!(result.centroid, result.points[0]);
    }

    #[test]
    fn test_tie_keeps_lowest_index() {
        let result = select_representative(&[s(0.5, 0.25), s(0.5, 0.25)]).unwrap();
        assert_eq!(result.index, 0);
        assert_eq!(
            result.centroid,
            DerivedPoint { linearity: 0.5, branching: 0.25, cocluster: 0.25 }
        );
    }

    #[test]
    fn test_three_point_scenario() {
        let result = select_representative(&[s(1.0, 0.0), s(0.0, 1.0), s(0.5, 0.5)]).unwrap();
        assert_eq!(result.index, 2);
        assert!((result.centroid.linearity - 0.5).abs() < EPS);
        assert!((result.centroid.branching - 0.5).abs() < EPS);
        assert!(result.centroid.cocluster.abs() < EPS);

        let d0 = euclidean_distance(&result.points[0], &result.centroid);
        let d1 = euclidean_distance(&result.points[1], &result.centroid);
        assert!((d0 - 0.5f64.sqrt()).abs() < EPS);
        assert!((d1 - 0.5f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_rejects_empty_and_nan() {
        assert_eq!(select_representative(&[]), Err(InvalidInputError::EmptySample));

        let err = select_representative(&[s(0.1, 0.1), s(f64::NAN, 0.2)]).unwrap_err();
        assert!(matches!(
            err,
            InvalidInputError::NonFinite { index: 1, field: "linearity_index", .. }
        ));

        let err = compute_derived_points(&[s(0.1, f64::INFINITY)]).unwrap_err();
        assert!(matches!(
            err,
            InvalidInputError::NonFinite { index: 0, field: "branching_index", .. }
        ));
    }

    #[test]
    fn test_rejects_overflowing_cocluster() {
        let err = compute_derived_points(&[s(0.2, 0.3), s(1e308, 1e308)]).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::NonFinite { index: 1, field: "cocluster_index", value: f64::NEG_INFINITY }
        );
        assert!(select_representative(&[s(f64::MAX, f64::MAX)]).is_err());

        // Large but summable indices are still accepted
        let points = compute_derived_points(&[s(1e307, -1e307)]).unwrap();
        assert_eq!(points[0].cocluster, 1.0);
    }

    #[test]
    fn test_labeled_selection() {
        let sample = [s(1.0, 0.0), s(0.0, 1.0), s(0.5, 0.5)];
        let ids = ["3", "7", "12"];
        let (result, id) = select_representative_labeled(&sample, &ids).unwrap();
        assert_eq!(result.index, 2);
        assert_eq!(*id, "12");

        let err = select_representative_labeled(&sample, &ids[..2]).unwrap_err();
        assert_eq!(err, InvalidInputError::LengthMismatch { expected: 3, actual: 2 });
    }
}
