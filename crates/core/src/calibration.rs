//! Personal-baseline calibration.
//!
//! A [`CalibrationRun`] accumulates frames for one user. Completing it folds
//! the frames into a [`CalibrationProfile`]: average camera quality, the
//! neutral level of the expression proxy, a symmetry estimate and, when
//! landmarks were captured, a per-feature neutral vector with its range of
//! motion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::normalization::{
    average_feature_vector, compute_symmetry_index, extract_movement_feature_vector,
    feature_range, summarize_expression,
};
use crate::quality::{evaluate_quality, recommended_calibration_seconds};
use crate::types::{
    clamp_unit, validate_landmarks, validate_quality_input, DeviceProfile, DistanceBucket,
    FeatureRange, MovementFeatureVector, Point3D, QualityBreakdown, QualityInput, QualityLevel,
    Timestamp, UserId,
};

/// Profile format produced by this module.
pub const CALIBRATION_VERSION: &str = "v2";

/// Duration the client is asked to calibrate for.
pub const TARGET_DURATION_SEC: u32 = 90;

/// Aggregate average below this is `poor`.
pub const AGGREGATE_POOR_BELOW: f64 = 0.45;
/// Aggregate average below this (and not poor) is `fair`.
pub const AGGREGATE_FAIR_BELOW: f64 = 0.72;

/// Minimum frame count used as the landmark-coverage denominator.
pub const MIN_COVERAGE_FRAMES: usize = 20;

const QUALITY_CONFIDENCE_WEIGHT: f64 = 0.65;
const COVERAGE_CONFIDENCE_WEIGHT: f64 = 0.35;

/// Perturbation applied to the expression series to estimate left/right balance.
const SYMMETRY_PERTURBATION: f64 = 0.01;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One frame captured while calibrating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationFrame {
    /// Server receive time.
    pub timestamp: Timestamp,
    pub quality: QualityInput,
    pub expression_proxy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Point3D>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark_model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_breakdown: Option<QualityBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_bucket: Option<DistanceBucket>,
}

impl CalibrationFrame {
    fn feature_vector(&self) -> Option<MovementFeatureVector> {
        self.landmarks
            .as_deref()
            .filter(|points| !points.is_empty())
            .map(extract_movement_feature_vector)
    }
}

/// Reject frames with non-finite numbers.
pub fn validate_calibration_frame(frame: &CalibrationFrame) -> Result<(), CoreError> {
    validate_quality_input(&frame.quality)?;
    if !frame.expression_proxy.is_finite() {
        return Err(CoreError::Validation(
            "expressionProxy must be a finite number".into(),
        ));
    }
    if let Some(points) = &frame.landmarks {
        validate_landmarks(points)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationStart {
    pub calibration_id: Uuid,
    pub target_duration_sec: u32,
    pub started_at: Timestamp,
}

/// Running quality after a frame was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProgress {
    pub quality_level: QualityLevel,
    pub average_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityStats {
    pub average_score: f64,
    pub sample_count: usize,
    pub recommended_duration_sec: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineGeometry {
    pub neutral_expression_proxy: f64,
    pub expression_std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetryStats {
    pub index: f64,
}

/// Landmark-derived personal baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBaselineV2 {
    pub calibration_version: String,
    pub neutral_expression_proxy: f64,
    pub neutral_features: MovementFeatureVector,
    pub range_of_motion: FeatureRange,
    pub confidence: f64,
}

/// The single live calibration result for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationProfile {
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub calibration_version: String,
    pub quality_stats: QualityStats,
    pub baseline_geometry: BaselineGeometry,
    pub symmetry: SymmetryStats,
    pub device_profile: DeviceProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_baseline_v2: Option<PersonalBaselineV2>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Map an average calibration score to its level.
pub fn aggregate_level(average_score: f64) -> QualityLevel {
    if average_score < AGGREGATE_POOR_BELOW {
        QualityLevel::Poor
    } else if average_score < AGGREGATE_FAIR_BELOW {
        QualityLevel::Fair
    } else {
        QualityLevel::Good
    }
}

/// In-progress calibration owned by one user.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub id: Uuid,
    pub user_id: UserId,
    pub started_at: Timestamp,
    pub device_profile: DeviceProfile,
    pub frames: Vec<CalibrationFrame>,
}

impl CalibrationRun {
    pub fn new(user_id: UserId, device_profile: DeviceProfile, started_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            started_at,
            device_profile,
            frames: Vec::new(),
        }
    }

    /// Mean overall quality across every frame so far; 0.0 when empty.
    ///
    /// Recomputed from the full frame list on every call.
    pub fn average_quality(&self) -> f64 {
        let total: f64 = self
            .frames
            .iter()
            .map(|f| evaluate_quality(&f.quality).overall)
            .sum();
        total / self.frames.len().max(1) as f64
    }

    /// Append a frame and report the running quality.
    pub fn push_frame(&mut self, frame: CalibrationFrame) -> CalibrationProgress {
        self.frames.push(frame);
        let average_score = self.average_quality();
        CalibrationProgress {
            quality_level: aggregate_level(average_score),
            average_score,
        }
    }

    /// Fold all frames into a profile.
    pub fn build_profile(&self, created_at: Timestamp) -> CalibrationProfile {
        let average_score = self.average_quality();
        let level = aggregate_level(average_score);

        let series: Vec<f64> = self.frames.iter().map(|f| f.expression_proxy).collect();
        let summary = summarize_expression(&series);
        let left: Vec<f64> = series.iter().map(|v| v * (1.0 - SYMMETRY_PERTURBATION)).collect();
        let right: Vec<f64> = series.iter().map(|v| v * (1.0 + SYMMETRY_PERTURBATION)).collect();

        let features: Vec<MovementFeatureVector> =
            self.frames.iter().filter_map(CalibrationFrame::feature_vector).collect();

        let personal_baseline_v2 = if features.is_empty() {
            None
        } else {
            let coverage = clamp_unit(
                features.len() as f64 / self.frames.len().max(MIN_COVERAGE_FRAMES) as f64,
            );
            Some(PersonalBaselineV2 {
                calibration_version: CALIBRATION_VERSION.to_string(),
                neutral_expression_proxy: summary.neutral,
                neutral_features: average_feature_vector(&features),
                range_of_motion: feature_range(&features),
                confidence: clamp_unit(
                    average_score * QUALITY_CONFIDENCE_WEIGHT
                        + coverage * COVERAGE_CONFIDENCE_WEIGHT,
                ),
            })
        };

        CalibrationProfile {
            user_id: self.user_id.clone(),
            created_at,
            calibration_version: CALIBRATION_VERSION.to_string(),
            quality_stats: QualityStats {
                average_score,
                sample_count: self.frames.len(),
                recommended_duration_sec: recommended_calibration_seconds(level),
            },
            baseline_geometry: BaselineGeometry {
                neutral_expression_proxy: summary.neutral,
                expression_std_dev: summary.deviation,
            },
            symmetry: SymmetryStats {
                index: compute_symmetry_index(&left, &right),
            },
            device_profile: self.device_profile.clone(),
            personal_baseline_v2,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Roughly normal offsets (mean 0, sd ~0.03).
    const PROXY_OFFSETS: [f64; 20] = [
        0.012, -0.031, 0.044, -0.006, 0.021, -0.018, 0.003, 0.037, -0.042, 0.009,
        -0.025, 0.015, -0.002, 0.028, -0.036, 0.006, -0.011, 0.019, 0.033, -0.024,
    ];

    fn device() -> DeviceProfile {
        DeviceProfile {
            platform: "web".into(),
            user_agent: "test-agent".into(),
            video_width: 640.0,
            video_height: 480.0,
        }
    }

    fn decent_quality() -> QualityInput {
        QualityInput {
            brightness: 0.6,
            blur: 0.3,
            face_coverage: 0.24,
            head_yaw_deg: 10.0,
            occlusion: 0.3,
            fps: 16.0,
            face_signal: None,
        }
    }

    fn frame(expression_proxy: f64, landmarks: Option<Vec<Point3D>>) -> CalibrationFrame {
        CalibrationFrame {
            timestamp: Utc::now(),
            quality: decent_quality(),
            expression_proxy,
            landmarks,
            landmark_model_version: None,
            quality_breakdown: None,
            distance_bucket: None,
        }
    }

    fn face(mouth_half_width: f64) -> Vec<Point3D> {
        vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(-0.3, -0.1, 0.0),
            Point3D::new(0.3, -0.1, 0.0),
            Point3D::new(0.0, 0.12, 0.0),
            Point3D::new(0.0, 0.5, 0.0),
            Point3D::new(-mouth_half_width, 0.2, 0.0),
            Point3D::new(mouth_half_width, 0.2, 0.0),
            Point3D::new(0.0, 0.18, 0.0),
            Point3D::new(0.0, 0.26, 0.0),
            Point3D::new(-0.25, 0.18, 0.0),
            Point3D::new(0.25, 0.18, 0.0),
        ]
    }

    fn run() -> CalibrationRun {
        CalibrationRun::new("user-1".into(), device(), Utc::now())
    }

    #[test]
    fn aggregate_level_cutovers() {
        assert_eq!(aggregate_level(0.44), QualityLevel::Poor);
        assert_eq!(aggregate_level(0.45), QualityLevel::Fair);
        assert_eq!(aggregate_level(0.72), QualityLevel::Good);
    }

    #[test]
    fn twenty_frame_scenario() {
        let mut run = run();
        for offset in PROXY_OFFSETS {
            run.push_frame(frame(1.0 + offset, None));
        }
        let profile = run.build_profile(Utc::now());

        assert_eq!(profile.quality_stats.sample_count, 20);
        assert!((profile.quality_stats.average_score - 0.7366).abs() < 0.01);
        let neutral = profile.baseline_geometry.neutral_expression_proxy;
        assert!((0.9..=1.1).contains(&neutral));
        assert!(profile.baseline_geometry.expression_std_dev > 0.0);
        assert!(profile.symmetry.index > 0.9);
        assert_eq!(profile.calibration_version, CALIBRATION_VERSION);
        assert!(profile.personal_baseline_v2.is_none());
    }

    #[test]
    fn running_average_recomputes_over_all_frames() {
        let mut run = run();
        let first = run.push_frame(frame(1.0, None));
        let mut poor = frame(1.0, None);
        poor.quality = QualityInput {
            brightness: 0.1,
            blur: 0.02,
            face_coverage: 0.05,
            head_yaw_deg: 30.0,
            occlusion: 0.85,
            fps: 6.0,
            face_signal: None,
        };
        let poor_overall = evaluate_quality(&poor.quality).overall;
        let second = run.push_frame(poor);
        let expected = (first.average_score + poor_overall) / 2.0;
        assert!((second.average_score - expected).abs() < 1e-9);
        assert!(second.average_score < first.average_score);
    }

    #[test]
    fn empty_run_completes_with_zeroed_stats() {
        let profile = run().build_profile(Utc::now());
        assert_eq!(profile.quality_stats.sample_count, 0);
        assert_eq!(profile.quality_stats.average_score, 0.0);
        assert_eq!(profile.quality_stats.recommended_duration_sec, 180);
        assert_eq!(profile.symmetry.index, 0.5);
    }

    #[test]
    fn landmarks_produce_personal_baseline() {
        let mut run = run();
        for i in 0..10 {
            let half_width = 0.18 + i as f64 * 0.005;
            run.push_frame(frame(1.0, Some(face(half_width))));
        }
        run.push_frame(frame(1.0, Some(Vec::new())));
        let profile = run.build_profile(Utc::now());
        let baseline = profile.personal_baseline_v2.expect("landmark baseline");

        assert_eq!(baseline.calibration_version, CALIBRATION_VERSION);
        assert!(baseline.neutral_features.smile_ratio > 0.5);
        assert!(baseline.range_of_motion.smile_ratio > 0.1);
        assert!(baseline.range_of_motion.jaw_drop_ratio >= 0.03);

        // 10 landmark frames against a denominator of 20.
        let expected = clamp_unit(profile.quality_stats.average_score * 0.65 + 0.5 * 0.35);
        assert!((baseline.confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn profile_wire_format_is_camel_case() {
        let mut run = run();
        run.push_frame(frame(1.0, Some(face(0.2))));
        let json = serde_json::to_value(run.build_profile(Utc::now())).unwrap();
        assert!(json["qualityStats"]["sampleCount"].is_number());
        assert!(json["baselineGeometry"]["neutralExpressionProxy"].is_number());
        assert!(json["personalBaselineV2"]["rangeOfMotion"]["cheekLiftRatio"].is_number());
        assert_eq!(json["calibrationVersion"], "v2");
    }

    #[test]
    fn validation_rejects_non_finite_proxy() {
        let mut f = frame(f64::NAN, None);
        assert!(validate_calibration_frame(&f).is_err());
        f.expression_proxy = 1.0;
        assert!(validate_calibration_frame(&f).is_ok());
        f.landmarks = Some(vec![Point3D::new(f64::NAN, 0.0, 0.0)]);
        assert!(validate_calibration_frame(&f).is_err());
    }
}
