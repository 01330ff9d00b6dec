//! Frame evaluator: one noisy measurement in, one stable coaching verdict out.
//!
//! Flicker is suppressed with hysteresis keyed off the previous status. The
//! status decision is applied in a fixed order:
//!
//! 1. still preparing and off target -> yellow
//! 2. confidence below [`CONFIDENCE_FLOOR`] -> yellow (+ low-confidence reason)
//! 3. off target -> red when accuracy < [`OUT_OF_RANGE_RED_BELOW`], else yellow
//! 4. on target, accuracy < [`IN_RANGE_RED_BELOW`] -> red
//! 5. on target, accuracy < [`IN_RANGE_YELLOW_BELOW`] -> yellow
//! 6. otherwise green
//!
//! followed by the green-upgrade override and then the red-downgrade
//! override, so a low-confidence frame can never end red.

use crate::movements::MovementDefinition;
use crate::phase::{hold_progress_fraction, next_phase};
use crate::types::{
    clamp_unit, EvaluationDebug, FrameEvaluation, QualityScore, SessionPhase, StatusColor,
};

// ---------------------------------------------------------------------------
// Tuning constants
// ---------------------------------------------------------------------------

/// Band widening after a green or yellow frame.
pub const TOLERANCE_AFTER_ENGAGED: f64 = 0.03;
/// Band widening after a red frame.
pub const TOLERANCE_AFTER_RED: f64 = 0.015;
/// Distance forgiven from the band center after a green frame.
pub const ACCURACY_HYSTERESIS: f64 = 0.02;
/// Smallest half-band used as a denominator.
const MIN_HALF_BAND: f64 = 0.001;

pub const LANDMARK_BOOST: f64 = 0.08;
/// Applied instead of [`LANDMARK_BOOST`] when only the expression proxy was used.
pub const PROXY_PENALTY: f64 = -0.06;
/// Maximum boost from a fully confident calibration baseline.
pub const BASELINE_BOOST: f64 = 0.08;

pub const CONFIDENCE_FLOOR: f64 = 0.35;
/// Below this confidence a red verdict is downgraded to yellow.
pub const RED_CONFIDENCE_CAP: f64 = 0.42;
/// Accuracy needed to keep green after a green frame.
pub const GREEN_HOLD_ACCURACY: f64 = 0.52;
/// Confidence needed to keep green after a green frame.
pub const GREEN_HOLD_CONFIDENCE: f64 = 0.5;

/// Off-target accuracy below which the verdict is red. Older tuning: 0.40.
pub const OUT_OF_RANGE_RED_BELOW: f64 = 0.34;
pub const IN_RANGE_RED_BELOW: f64 = 0.45;
/// On-target accuracy below which the verdict is yellow. Older tuning: 0.68.
pub const IN_RANGE_YELLOW_BELOW: f64 = 0.65;

pub const MAX_ERROR_REASONS: usize = 3;
const MAX_DEBUG_NOTES: usize = 2;

/// Model version reported when the caller did not name one.
pub const UNKNOWN_MODEL_VERSION: &str = "v1-unknown";

// ---------------------------------------------------------------------------
// Coaching text
// ---------------------------------------------------------------------------

pub const REASON_FORM: &str = "Bring the movement angle closer to the target.";
pub const REASON_LOW_CONFIDENCE: &str = "Measurement confidence is low.";

const AUDIO_GREEN: &str = "Great, keep the form.";
const AUDIO_RED: &str = "Ease back and follow the reference video.";
const AUDIO_YELLOW_FORM: &str = "Going well, adjust the movement angle a little more.";
const AUDIO_YELLOW_LOW_CONFIDENCE: &str = "Keep the movement slow and controlled.";
const AUDIO_YELLOW: &str = "Keep the rhythm, align the form gently.";

const VISUAL_GREEN: &str = "Correct form";
const VISUAL_RED: &str = "Form correction needed";
const VISUAL_PREPARE: &str = "Get ready: match the reference position";
const VISUAL_YELLOW_FORM: &str = "Align the form a little more";
const VISUAL_YELLOW: &str = "Keep the movement controlled";

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Everything needed to judge one frame. Previous phase and status are
/// threaded through by the caller.
#[derive(Debug, Clone)]
pub struct EvaluateFrameInput<'a> {
    pub movement: &'a MovementDefinition,
    /// Baseline-normalized measurement.
    pub measured_value: f64,
    pub quality: &'a QualityScore,
    pub previous_phase: SessionPhase,
    pub previous_status: StatusColor,
    pub hold_progress_sec: f64,
    pub used_landmarks: bool,
    pub landmark_model_version: Option<&'a str>,
    /// Calibration confidence in `[0, 1]`, when a personal baseline exists.
    pub baseline_confidence: Option<f64>,
}

/// Triangular falloff from the band center; 1.0 at center, 0.0 at the edge.
pub fn value_accuracy(
    value: f64,
    target_min: f64,
    target_max: f64,
    previous_status: StatusColor,
) -> f64 {
    let center = (target_min + target_max) / 2.0;
    let half_band = ((target_max - target_min) / 2.0).max(MIN_HALF_BAND);
    let hysteresis = if previous_status == StatusColor::Green {
        ACCURACY_HYSTERESIS
    } else {
        0.0
    };
    let delta = (value - center).abs();
    clamp_unit(1.0 - (delta - hysteresis).max(0.0) / half_band)
}

/// In-range test with the band widened according to the previous status.
pub fn in_target_range(
    value: f64,
    movement: &MovementDefinition,
    previous_status: StatusColor,
) -> bool {
    let tolerance = match previous_status {
        StatusColor::Green | StatusColor::Yellow => TOLERANCE_AFTER_ENGAGED,
        StatusColor::Red => TOLERANCE_AFTER_RED,
    };
    value >= movement.target_min - tolerance && value <= movement.target_max + tolerance
}

/// Measurement confidence from signal quality and measurement path.
pub fn measurement_confidence(
    quality: &QualityScore,
    used_landmarks: bool,
    baseline_confidence: Option<f64>,
) -> f64 {
    let landmark_boost = if used_landmarks { LANDMARK_BOOST } else { PROXY_PENALTY };
    let baseline_boost = clamp_unit(baseline_confidence.unwrap_or(0.0)) * BASELINE_BOOST;
    let blended =
        quality.overall * 0.85 + quality.blur_score * 0.15 + landmark_boost + baseline_boost;
    let quality_only = quality.overall * 0.72 + landmark_boost;
    clamp_unit(blended.max(quality_only))
}

fn audio_cue(status: StatusColor, has_form_error: bool, has_low_confidence: bool) -> &'static str {
    match status {
        StatusColor::Green => AUDIO_GREEN,
        StatusColor::Red => AUDIO_RED,
        StatusColor::Yellow if has_form_error => AUDIO_YELLOW_FORM,
        StatusColor::Yellow if has_low_confidence => AUDIO_YELLOW_LOW_CONFIDENCE,
        StatusColor::Yellow => AUDIO_YELLOW,
    }
}

fn visual_cue(
    status: StatusColor,
    previous_phase: SessionPhase,
    has_form_error: bool,
) -> &'static str {
    match status {
        StatusColor::Green => VISUAL_GREEN,
        StatusColor::Red => VISUAL_RED,
        StatusColor::Yellow if previous_phase == SessionPhase::Prepare => VISUAL_PREPARE,
        StatusColor::Yellow if has_form_error => VISUAL_YELLOW_FORM,
        StatusColor::Yellow => VISUAL_YELLOW,
    }
}

/// Judge one frame of a movement.
pub fn evaluate_movement_frame(input: &EvaluateFrameInput<'_>) -> FrameEvaluation {
    let movement = input.movement;
    let in_range = in_target_range(input.measured_value, movement, input.previous_status);
    let accuracy = value_accuracy(
        input.measured_value,
        movement.target_min,
        movement.target_max,
        input.previous_status,
    );
    let confidence =
        measurement_confidence(input.quality, input.used_landmarks, input.baseline_confidence);

    let phase = next_phase(
        input.previous_phase,
        in_range,
        hold_progress_fraction(input.hold_progress_sec, movement.hold_sec),
    );

    let mut errors = input.quality.reasons.clone();
    if !in_range {
        errors.push(REASON_FORM.to_string());
    }

    let mut status = if input.previous_phase == SessionPhase::Prepare && !in_range {
        StatusColor::Yellow
    } else if confidence < CONFIDENCE_FLOOR {
        if !errors.iter().any(|e| e == REASON_LOW_CONFIDENCE) {
            errors.push(REASON_LOW_CONFIDENCE.to_string());
        }
        StatusColor::Yellow
    } else if !in_range {
        if accuracy < OUT_OF_RANGE_RED_BELOW {
            StatusColor::Red
        } else {
            StatusColor::Yellow
        }
    } else if accuracy < IN_RANGE_RED_BELOW {
        StatusColor::Red
    } else if accuracy < IN_RANGE_YELLOW_BELOW {
        StatusColor::Yellow
    } else {
        StatusColor::Green
    };

    let hysteresis_applied =
        input.previous_status == StatusColor::Green && accuracy > GREEN_HOLD_ACCURACY;
    if hysteresis_applied && status == StatusColor::Yellow && confidence >= GREEN_HOLD_CONFIDENCE {
        status = StatusColor::Green;
    }
    if confidence < RED_CONFIDENCE_CAP && status == StatusColor::Red {
        status = StatusColor::Yellow;
    }

    let has_form_error = errors.iter().any(|e| e == REASON_FORM);
    let has_low_confidence = errors.iter().any(|e| e == REASON_LOW_CONFIDENCE);

    let debug = EvaluationDebug {
        model_version: input
            .landmark_model_version
            .unwrap_or(UNKNOWN_MODEL_VERSION)
            .to_string(),
        used_landmarks: input.used_landmarks,
        measured_value: input.measured_value,
        hysteresis_applied,
        notes: errors.iter().take(MAX_DEBUG_NOTES).cloned().collect(),
    };

    FrameEvaluation {
        movement_id: movement.id.to_string(),
        status_color: status,
        accuracy,
        confidence,
        audio_cue: audio_cue(status, has_form_error, has_low_confidence).to_string(),
        visual_cue: visual_cue(status, input.previous_phase, has_form_error).to_string(),
        error_reasons: errors.into_iter().take(MAX_ERROR_REASONS).collect(),
        phase,
        debug: Some(debug),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
