//! Turning a raw frame into the scalar a movement is judged on.
//!
//! Two paths exist. With landmarks and a landmark baseline, the target
//! feature's deviation from neutral is scaled by the user's range of motion.
//! Otherwise the expression proxy is divided by its calibrated neutral value.
//! Either way `1.0` means "at rest" relative to the user's own baseline.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationProfile;
use crate::normalization::extract_movement_feature_vector;
use crate::types::{clamp_unit, Point3D, TargetFeature};

/// Scale applied to a range-normalized feature delta.
pub const LANDMARK_GAIN: f64 = 0.1;
/// Smallest range of motion used as a denominator.
pub const MIN_RANGE_OF_MOTION: f64 = 0.02;
/// Smallest neutral proxy used as a denominator.
const MIN_NEUTRAL_PROXY: f64 = 0.001;

/// Below this anchor length a landmark rule cannot be evaluated.
const MIN_ANCHOR_LENGTH: f64 = 0.00001;
const MIN_RULE_HALF_BAND: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub value: f64,
    pub used_landmarks: bool,
    /// Confidence of the landmark baseline, on the landmark path only.
    pub baseline_confidence: Option<f64>,
}

/// Measure one frame against the user's calibration, if any.
pub fn measure(
    profile: Option<&CalibrationProfile>,
    expression_proxy: f64,
    landmarks: Option<&[Point3D]>,
    target_feature: TargetFeature,
) -> Measurement {
    let baseline = profile.and_then(|p| p.personal_baseline_v2.as_ref());
    let points = landmarks.filter(|points| !points.is_empty());

    if let (Some(points), Some(baseline)) = (points, baseline) {
        let live = extract_movement_feature_vector(points).get(target_feature);
        let neutral = baseline.neutral_features.get(target_feature);
        let range = baseline.range_of_motion.get(target_feature).max(MIN_RANGE_OF_MOTION);
        return Measurement {
            value: 1.0 + LANDMARK_GAIN * (live - neutral) / range,
            used_landmarks: true,
            baseline_confidence: Some(baseline.confidence),
        };
    }

    let neutral = profile
        .map(|p| p.baseline_geometry.neutral_expression_proxy)
        .unwrap_or(1.0);
    Measurement {
        value: expression_proxy / neutral.max(MIN_NEUTRAL_PROXY),
        used_landmarks: false,
        baseline_confidence: None,
    }
}

// ---------------------------------------------------------------------------
// Landmark rules
// ---------------------------------------------------------------------------

/// Distance-ratio rule: `|target| / |anchor|` must land in `[ratio_min, ratio_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkRule {
    pub id: String,
    pub anchor_indexes: [usize; 2],
    pub target_indexes: [usize; 2],
    pub ratio_min: f64,
    pub ratio_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkEvaluation {
    pub score: f64,
    pub in_range: bool,
}

fn rule_ratio(points: &[Point3D], rule: &LandmarkRule) -> Option<f64> {
    let a0 = points.get(rule.anchor_indexes[0])?;
    let a1 = points.get(rule.anchor_indexes[1])?;
    let t0 = points.get(rule.target_indexes[0])?;
    let t1 = points.get(rule.target_indexes[1])?;
    let anchor = a0.distance(a1);
    if anchor < MIN_ANCHOR_LENGTH {
        return None;
    }
    Some(t0.distance(t1) / anchor)
}

/// Score a landmark set against a rule. Missing points score 0.
///
/// Client-side helper for on-device rule checks; the frame-eval path scores
/// through [`measure`] instead.
pub fn evaluate_landmark_rule(points: &[Point3D], rule: &LandmarkRule) -> LandmarkEvaluation {
    let Some(ratio) = rule_ratio(points, rule) else {
        return LandmarkEvaluation {
            score: 0.0,
            in_range: false,
        };
    };

    if ratio >= rule.ratio_min && ratio <= rule.ratio_max {
        return LandmarkEvaluation {
            score: 1.0,
            in_range: true,
        };
    }

    // Falloff is measured from the nearest edge over one half band.
    let half_band = ((rule.ratio_max - rule.ratio_min) / 2.0).max(MIN_RULE_HALF_BAND);
    let distance = if ratio < rule.ratio_min {
        rule.ratio_min - ratio
    } else {
        ratio - rule.ratio_max
    };
    LandmarkEvaluation {
        score: clamp_unit(1.0 - distance / half_band),
        in_range: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{BaselineGeometry, PersonalBaselineV2, QualityStats, SymmetryStats};
    use crate::types::{DeviceProfile, FeatureRange, MovementFeatureVector};

    fn profile(neutral_proxy: f64, baseline: Option<PersonalBaselineV2>) -> CalibrationProfile {
        CalibrationProfile {
            user_id: "u".into(),
            created_at: chrono::Utc::now(),
            calibration_version: "v2".into(),
            quality_stats: QualityStats {
                average_score: 0.8,
                sample_count: 20,
                recommended_duration_sec: 90,
            },
            baseline_geometry: BaselineGeometry {
                neutral_expression_proxy: neutral_proxy,
                expression_std_dev: 0.02,
            },
            symmetry: SymmetryStats { index: 0.99 },
            device_profile: DeviceProfile {
                platform: "web".into(),
                user_agent: "ua".into(),
                video_width: 640.0,
                video_height: 480.0,
            },
            personal_baseline_v2: baseline,
        }
    }

    fn baseline(cheek_lift: f64, range: f64) -> PersonalBaselineV2 {
        PersonalBaselineV2 {
            calibration_version: "v2".into(),
            neutral_expression_proxy: 1.0,
            neutral_features: MovementFeatureVector {
                cheek_lift_ratio: cheek_lift,
                ..MovementFeatureVector::default()
            },
            range_of_motion: FeatureRange {
                smile_ratio: range,
                mouth_open_ratio: range,
                jaw_drop_ratio: range,
                cheek_lift_ratio: range,
            },
            confidence: 0.75,
        }
    }

    /// Both mouth corners sit `gap` below their cheek.
    fn face(gap: f64) -> Vec<Point3D> {
        vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(-0.3, -0.1, 0.0),
            Point3D::new(0.3, -0.1, 0.0),
            Point3D::new(0.0, 0.12, 0.0),
            Point3D::new(0.0, 0.5, 0.0),
            Point3D::new(-0.2, 0.18 + gap, 0.0),
            Point3D::new(0.2, 0.18 + gap, 0.0),
            Point3D::new(0.0, 0.18, 0.0),
            Point3D::new(0.0, 0.26, 0.0),
            Point3D::new(-0.25, 0.18, 0.0),
            Point3D::new(0.25, 0.18, 0.0),
        ]
    }

    #[test]
    fn proxy_path_without_profile_divides_by_one() {
        let m = measure(None, 1.04, None, TargetFeature::CheekLiftRatio);
        assert_eq!(m.value, 1.04);
        assert!(!m.used_landmarks);
        assert!(m.baseline_confidence.is_none());
    }

    #[test]
    fn proxy_path_uses_calibrated_neutral() {
        let p = profile(0.8, None);
        let m = measure(Some(&p), 0.88, Some(face(0.0).as_slice()), TargetFeature::CheekLiftRatio);
        assert!((m.value - 1.1).abs() < 1e-9);
        assert!(!m.used_landmarks);
    }

    #[test]
    fn proxy_path_guards_zero_neutral() {
        let p = profile(0.0, None);
        let m = measure(Some(&p), 0.002, None, TargetFeature::CheekLiftRatio);
        assert!((m.value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn landmark_path_scales_by_range_of_motion() {
        // Gap 0.035 reads a cheek lift of 0.9.
        let p = profile(1.0, Some(baseline(0.8, 0.2)));
        let m = measure(Some(&p), 5.0, Some(face(0.035).as_slice()), TargetFeature::CheekLiftRatio);
        assert!(m.used_landmarks);
        assert_eq!(m.baseline_confidence, Some(0.75));
        assert!((m.value - 1.05).abs() < 1e-9);
    }

    #[test]
    fn landmark_path_floors_tiny_range() {
        let p = profile(1.0, Some(baseline(0.8, 0.0)));
        let m = measure(Some(&p), 1.0, Some(face(0.035).as_slice()), TargetFeature::CheekLiftRatio);
        assert!((m.value - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_landmarks_fall_back_to_proxy() {
        let p = profile(1.0, Some(baseline(0.8, 0.2)));
        let m = measure(Some(&p), 1.02, Some(&[][..]), TargetFeature::CheekLiftRatio);
        assert!(!m.used_landmarks);
        assert_eq!(m.value, 1.02);
    }

    fn mouth_rule(min: f64, max: f64) -> LandmarkRule {
        LandmarkRule {
            id: "smile-width".into(),
            anchor_indexes: [1, 2],
            target_indexes: [5, 6],
            ratio_min: min,
            ratio_max: max,
        }
    }

    #[test]
    fn landmark_rule_inside_band() {
        // Mouth 0.4 over eyes 0.6.
        let eval = evaluate_landmark_rule(&face(0.0), &mouth_rule(0.6, 0.7));
        assert_eq!(eval, LandmarkEvaluation { score: 1.0, in_range: true });
    }

    #[test]
    fn landmark_rule_falls_off_outside_band() {
        let eval = evaluate_landmark_rule(&face(0.0), &mouth_rule(0.7, 0.9));
        assert!(!eval.in_range);
        // 0.0333 below a band with half width 0.1.
        assert!((eval.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn landmark_rule_missing_points_scores_zero() {
        let eval = evaluate_landmark_rule(&face(0.0)[..4], &mouth_rule(0.6, 0.7));
        assert_eq!(eval.score, 0.0);
        assert!(!eval.in_range);
    }

    #[test]
    fn landmark_rule_degenerate_anchor_scores_zero() {
        let points = vec![Point3D::default(); 11];
        let eval = evaluate_landmark_rule(&points, &mouth_rule(0.0, 1.0));
        assert_eq!(eval.score, 0.0);
    }
}
