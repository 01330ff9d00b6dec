//! Landmark feature normalization and series statistics.
//!
//! The canonical landmark layout has 11 points:
//!
//! ```text
//! 0 forehead   1 left eye    2 right eye   3 nose tip    4 chin
//! 5 mouth left 6 mouth right 7 upper lip   8 lower lip
//! 9 left cheek 10 right cheek
//! ```
//!
//! Ratios are taken against interocular distance (face width) or
//! forehead-to-chin distance (face height), so they do not depend on where
//! the face sits in the frame or how large it is.

use crate::types::{clamp_unit, FeatureRange, MovementFeatureVector, Point3D};

/// Number of points in the canonical landmark layout.
pub const CANONICAL_POINT_COUNT: usize = 11;

/// Positions substituted for missing canonical points.
const DEFAULT_POINTS: [Point3D; CANONICAL_POINT_COUNT] = [
    Point3D::new(0.0, 0.0, 0.0),
    Point3D::new(-0.25, -0.1, 0.0),
    Point3D::new(0.25, -0.1, 0.0),
    Point3D::new(0.0, 0.1, 0.0),
    Point3D::new(0.0, 0.5, 0.0),
    Point3D::new(-0.2, 0.2, 0.0),
    Point3D::new(0.2, 0.2, 0.0),
    Point3D::new(0.0, 0.18, 0.0),
    Point3D::new(0.0, 0.24, 0.0),
    Point3D::new(-0.3, 0.18, 0.0),
    Point3D::new(0.3, 0.18, 0.0),
];

/// Vertical mouth-corner-to-cheek distance at which cheek lift reads zero.
pub const CHEEK_LIFT_BAND: f64 = 0.35;

/// Smallest face width/height used as a denominator.
const MIN_FACE_DIMENSION: f64 = 0.0001;

/// Range of motion reported when fewer than two samples exist.
pub const SINGLE_SAMPLE_RANGE: f64 = 0.05;
/// Lower bound on any computed range of motion.
pub const MIN_FEATURE_RANGE: f64 = 0.03;

/// Denominator floor for the symmetry index.
const MIN_SYMMETRY_DENOM: f64 = 0.001;

// ---------------------------------------------------------------------------
// Landmark geometry
// ---------------------------------------------------------------------------

fn point(points: &[Point3D], index: usize) -> Point3D {
    points.get(index).copied().unwrap_or(DEFAULT_POINTS[index])
}

/// Divide coordinates by face dimensions. Non-positive dimensions count as 1.
///
/// Client-side helper; the server pipeline does not call it.
pub fn normalize_landmarks(points: &[Point3D], face_width: f64, face_height: f64) -> Vec<Point3D> {
    let width = if face_width <= 0.0 { 1.0 } else { face_width };
    let height = if face_height <= 0.0 { 1.0 } else { face_height };
    let depth = width.max(height);
    points
        .iter()
        .map(|p| Point3D::new(p.x / width, p.y / height, p.z / depth))
        .collect()
}

/// Derive the movement feature vector from a canonical landmark set.
///
/// Missing indices fall back to fixed default offsets, so short arrays are
/// accepted. The result is a pure function of the input.
pub fn extract_movement_feature_vector(points: &[Point3D]) -> MovementFeatureVector {
    let forehead = point(points, 0);
    let left_eye = point(points, 1);
    let right_eye = point(points, 2);
    let nose_tip = point(points, 3);
    let chin = point(points, 4);
    let mouth_left = point(points, 5);
    let mouth_right = point(points, 6);
    let upper_lip = point(points, 7);
    let lower_lip = point(points, 8);
    let left_cheek = point(points, 9);
    let right_cheek = point(points, 10);

    let face_width = left_eye.distance(&right_eye).max(MIN_FACE_DIMENSION);
    let face_height = forehead.distance(&chin).max(MIN_FACE_DIMENSION);

    let mouth_width = mouth_left.distance(&mouth_right) / face_width;
    let mouth_open = upper_lip.distance(&lower_lip) / face_height;
    let jaw_drop = nose_tip.distance(&chin) / face_height;
    let lift_left = clamp_unit(1.0 - (mouth_left.y - left_cheek.y).abs() / CHEEK_LIFT_BAND);
    let lift_right = clamp_unit(1.0 - (mouth_right.y - right_cheek.y).abs() / CHEEK_LIFT_BAND);

    MovementFeatureVector {
        smile_ratio: clamp_unit(mouth_width),
        mouth_open_ratio: clamp_unit(mouth_open),
        jaw_drop_ratio: clamp_unit(jaw_drop),
        cheek_lift_ratio: clamp_unit((lift_left + lift_right) / 2.0),
        symmetry_score: clamp_unit(1.0 - (lift_left - lift_right).abs()),
    }
}

// ---------------------------------------------------------------------------
// Vector aggregation
// ---------------------------------------------------------------------------

/// Fieldwise mean. An empty input yields the neutral default vector.
pub fn average_feature_vector(values: &[MovementFeatureVector]) -> MovementFeatureVector {
    if values.is_empty() {
        return MovementFeatureVector::default();
    }
    let n = values.len() as f64;
    let sum = values.iter().fold(
        MovementFeatureVector {
            symmetry_score: 0.0,
            ..MovementFeatureVector::default()
        },
        |acc, v| MovementFeatureVector {
            smile_ratio: acc.smile_ratio + v.smile_ratio,
            mouth_open_ratio: acc.mouth_open_ratio + v.mouth_open_ratio,
            jaw_drop_ratio: acc.jaw_drop_ratio + v.jaw_drop_ratio,
            cheek_lift_ratio: acc.cheek_lift_ratio + v.cheek_lift_ratio,
            symmetry_score: acc.symmetry_score + v.symmetry_score,
        },
    );
    MovementFeatureVector {
        smile_ratio: sum.smile_ratio / n,
        mouth_open_ratio: sum.mouth_open_ratio / n,
        jaw_drop_ratio: sum.jaw_drop_ratio / n,
        cheek_lift_ratio: sum.cheek_lift_ratio / n,
        symmetry_score: sum.symmetry_score / n,
    }
}

fn spread(values: &[MovementFeatureVector], field: fn(&MovementFeatureVector) -> f64) -> f64 {
    let (min, max) = values
        .iter()
        .map(field)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    (max - min).max(MIN_FEATURE_RANGE)
}

/// Fieldwise max-minus-min spread, never below the safety floor.
pub fn feature_range(values: &[MovementFeatureVector]) -> FeatureRange {
    if values.len() < 2 {
        return FeatureRange {
            smile_ratio: SINGLE_SAMPLE_RANGE,
            mouth_open_ratio: SINGLE_SAMPLE_RANGE,
            jaw_drop_ratio: SINGLE_SAMPLE_RANGE,
            cheek_lift_ratio: SINGLE_SAMPLE_RANGE,
        };
    }
    FeatureRange {
        smile_ratio: spread(values, |v| v.smile_ratio),
        mouth_open_ratio: spread(values, |v| v.mouth_open_ratio),
        jaw_drop_ratio: spread(values, |v| v.jaw_drop_ratio),
        cheek_lift_ratio: spread(values, |v| v.cheek_lift_ratio),
    }
}

// ---------------------------------------------------------------------------
// Scalar series
// ---------------------------------------------------------------------------

/// Neutral level and spread of an expression-proxy series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionSummary {
    pub neutral: f64,
    pub deviation: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn summarize_expression(values: &[f64]) -> ExpressionSummary {
    ExpressionSummary {
        neutral: mean(values),
        deviation: std_dev(values),
    }
}

/// Compare two sides of a measurement series; 1.0 is perfectly symmetric.
///
/// Returns 0.5 when either side has no samples.
pub fn compute_symmetry_index(left: &[f64], right: &[f64]) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.5;
    }
    let left_mean = mean(left);
    let right_mean = mean(right);
    let denom = (left_mean.abs() + right_mean.abs()).max(MIN_SYMMETRY_DENOM);
    (1.0 - (left_mean - right_mean).abs() / denom).max(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
