//! Camera signal quality scoring.
//!
//! Converts raw per-frame camera metrics into a normalized 0-1 score with
//! sub-scores, a discrete level and a short list of actionable reasons.
//! Scoring is total: any finite input yields a score.

use crate::types::{clamp_unit, FaceSignal, QualityInput, QualityLevel, QualityScore};

// ---------------------------------------------------------------------------
// Target bands
// ---------------------------------------------------------------------------

/// Brightness band that scores 1.0.
pub const BRIGHTNESS_BAND: (f64, f64) = (0.35, 0.75);

/// Face coverage band that scores 1.0. Earlier tuning used `(0.16, 0.40)`.
pub const COVERAGE_BAND: (f64, f64) = (0.10, 0.38);

/// Yaw in degrees at which the yaw score reaches zero.
pub const YAW_LIMIT_DEG: f64 = 35.0;

/// Frames per second at or below which the fps score is zero.
pub const FPS_FLOOR: f64 = 8.0;
/// Fps span above the floor over which the score ramps to 1.0.
pub const FPS_SPAN: f64 = 16.0;

/// Smallest band width used as a denominator.
const MIN_BAND_WIDTH: f64 = 0.01;

// ---------------------------------------------------------------------------
// Weights and level cutovers
// ---------------------------------------------------------------------------

pub const WEIGHT_BRIGHTNESS: f64 = 0.18;
pub const WEIGHT_BLUR: f64 = 0.18;
pub const WEIGHT_COVERAGE: f64 = 0.24;
pub const WEIGHT_YAW: f64 = 0.18;
pub const WEIGHT_OCCLUSION: f64 = 0.12;
pub const WEIGHT_FPS: f64 = 0.10;

/// Overall below this is `poor`.
pub const POOR_BELOW: f64 = 0.38;
/// Overall below this (and not poor) is `fair`.
pub const FAIR_BELOW: f64 = 0.66;

// ---------------------------------------------------------------------------
// Reason thresholds and texts
// ---------------------------------------------------------------------------

const REASON_BRIGHTNESS_BELOW: f64 = 0.45;
const REASON_BLUR_BELOW: f64 = 0.16;
const REASON_COVERAGE_BELOW: f64 = 0.2;
const REASON_YAW_BELOW: f64 = 0.45;
const REASON_OCCLUSION_BELOW: f64 = 0.45;
const REASON_FPS_BELOW: f64 = 0.4;

pub const REASON_LIGHTING: &str = "Adjust the lighting.";
pub const REASON_STEADY_CAMERA: &str = "Hold the camera steady.";
pub const REASON_MORE_LIGHT: &str = "Add a little more light.";
pub const REASON_FACE_IN_FRAME: &str = "Bring your face into the frame.";
pub const REASON_MOVE_CLOSER: &str = "Move a little closer to the camera.";
pub const REASON_FACE_STRAIGHT: &str = "Face the camera more directly.";
pub const REASON_UNCOVER_FACE: &str = "Keep your face uncovered.";
pub const REASON_LOW_FPS: &str = "Device is struggling, close background apps.";

/// Score a value against a target band: 1.0 inside, linear falloff outside.
pub fn target_band_score(value: f64, min: f64, max: f64) -> f64 {
    if value >= min && value <= max {
        return 1.0;
    }
    let distance = if value < min { min - value } else { value - max };
    clamp_unit(1.0 - distance / (max - min).max(MIN_BAND_WIDTH))
}

/// Map an overall score to its discrete level.
pub fn level_for(overall: f64) -> QualityLevel {
    if overall < POOR_BELOW {
        QualityLevel::Poor
    } else if overall < FAIR_BELOW {
        QualityLevel::Fair
    } else {
        QualityLevel::Good
    }
}

/// Score one frame of camera signal.
pub fn evaluate_quality(input: &QualityInput) -> QualityScore {
    let brightness_score =
        target_band_score(input.brightness, BRIGHTNESS_BAND.0, BRIGHTNESS_BAND.1);
    let blur_score = clamp_unit(input.blur);
    let coverage_score = target_band_score(input.face_coverage, COVERAGE_BAND.0, COVERAGE_BAND.1);
    let yaw_score = clamp_unit(1.0 - input.head_yaw_deg.abs() / YAW_LIMIT_DEG);
    let occlusion_score = clamp_unit(1.0 - input.occlusion);
    let fps_score = clamp_unit((input.fps - FPS_FLOOR) / FPS_SPAN);

    let overall = clamp_unit(
        brightness_score * WEIGHT_BRIGHTNESS
            + blur_score * WEIGHT_BLUR
            + coverage_score * WEIGHT_COVERAGE
            + yaw_score * WEIGHT_YAW
            + occlusion_score * WEIGHT_OCCLUSION
            + fps_score * WEIGHT_FPS,
    );

    // Geometry advice is meaningless when the detector cannot see faces.
    let has_face_geometry = input.face_signal != Some(FaceSignal::Unsupported);
    let face_missing = input.face_signal == Some(FaceSignal::NotDetected);

    let mut reasons = Vec::new();
    if brightness_score < REASON_BRIGHTNESS_BELOW {
        reasons.push(REASON_LIGHTING.to_string());
    }
    if blur_score < REASON_BLUR_BELOW
        && brightness_score > 0.68
        && coverage_score > 0.65
        && fps_score > 0.6
    {
        reasons.push(REASON_STEADY_CAMERA.to_string());
    } else if blur_score < REASON_BLUR_BELOW && brightness_score <= 0.58 {
        reasons.push(REASON_MORE_LIGHT.to_string());
    }
    if face_missing {
        reasons.push(REASON_FACE_IN_FRAME.to_string());
    } else if has_face_geometry && coverage_score < REASON_COVERAGE_BELOW {
        reasons.push(REASON_MOVE_CLOSER.to_string());
    }
    if has_face_geometry && yaw_score < REASON_YAW_BELOW {
        reasons.push(REASON_FACE_STRAIGHT.to_string());
    }
    if has_face_geometry && occlusion_score < REASON_OCCLUSION_BELOW {
        reasons.push(REASON_UNCOVER_FACE.to_string());
    }
    if fps_score < REASON_FPS_BELOW {
        reasons.push(REASON_LOW_FPS.to_string());
    }

    QualityScore {
        overall,
        brightness_score,
        blur_score,
        coverage_score,
        yaw_score,
        occlusion_score,
        fps_score,
        level: level_for(overall),
        reasons,
    }
}

/// Calibration length needed to reach a usable baseline at a quality level.
pub fn recommended_calibration_seconds(level: QualityLevel) -> u32 {
    match level {
        QualityLevel::Good => 90,
        QualityLevel::Fair => 120,
        QualityLevel::Poor => 180,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
