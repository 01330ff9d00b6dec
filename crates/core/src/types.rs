//! Shared domain types for the frame evaluation pipeline.
//!
//! Wire representations use camelCase field names so the browser client
//! can exchange them without translation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque, already-resolved owner identity.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Clamp a value into `[0.0, 1.0]`.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Status and phase
// ---------------------------------------------------------------------------

/// Tri-color coaching signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// Lenient parse; anything unrecognized is treated as yellow.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "green" => Self::Green,
            "red" => Self::Red,
            _ => Self::Yellow,
        }
    }
}

/// Phase of one repetition of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Prepare,
    Activate,
    Hold,
    Release,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Activate => "activate",
            Self::Hold => "hold",
            Self::Release => "release",
        }
    }

    /// Lenient parse; anything unrecognized restarts at `prepare`.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "activate" => Self::Activate,
            "hold" => Self::Hold,
            "release" => Self::Release,
            _ => Self::Prepare,
        }
    }
}

// ---------------------------------------------------------------------------
// Camera signal
// ---------------------------------------------------------------------------

/// Outcome of the browser face detector for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSignal {
    Detected,
    NotDetected,
    Unsupported,
}

/// Raw per-frame camera signal metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityInput {
    pub brightness: f64,
    /// Higher is sharper.
    pub blur: f64,
    pub face_coverage: f64,
    pub head_yaw_deg: f64,
    pub occlusion: f64,
    pub fps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_signal: Option<FaceSignal>,
}

/// Discrete camera quality level, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Poor,
    Fair,
    Good,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
        }
    }
}

/// Sub-scores and weighted overall score of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub brightness_score: f64,
    pub blur_score: f64,
    pub coverage_score: f64,
    pub yaw_score: f64,
    pub occlusion_score: f64,
    pub fps_score: f64,
    pub overall: f64,
}

/// Derived quality of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub overall: f64,
    pub brightness_score: f64,
    pub blur_score: f64,
    pub coverage_score: f64,
    pub yaw_score: f64,
    pub occlusion_score: f64,
    pub fps_score: f64,
    pub level: QualityLevel,
    pub reasons: Vec<String>,
}

impl QualityScore {
    pub fn breakdown(&self) -> QualityBreakdown {
        QualityBreakdown {
            brightness_score: self.brightness_score,
            blur_score: self.blur_score,
            coverage_score: self.coverage_score,
            yaw_score: self.yaw_score,
            occlusion_score: self.occlusion_score,
            fps_score: self.fps_score,
            overall: self.overall,
        }
    }
}

/// Coarse proximity of the face to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBucket {
    Near,
    Mid,
    Far,
}

impl DistanceBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Mid => "mid",
            Self::Far => "far",
        }
    }
}

/// Minimum face coverage classified as `near`.
pub const NEAR_COVERAGE_MIN: f64 = 0.30;
/// Minimum face coverage classified as `mid`.
pub const MID_COVERAGE_MIN: f64 = 0.14;

/// Classify face coverage into a distance bucket.
pub fn distance_bucket(face_coverage: f64) -> DistanceBucket {
    if face_coverage >= NEAR_COVERAGE_MIN {
        DistanceBucket::Near
    } else if face_coverage >= MID_COVERAGE_MIN {
        DistanceBucket::Mid
    } else {
        DistanceBucket::Far
    }
}

/// Capture device description recorded with a calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub platform: String,
    pub user_agent: String,
    pub video_width: f64,
    pub video_height: f64,
}

// ---------------------------------------------------------------------------
// Landmarks and features
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Scale-invariant movement features, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFeatureVector {
    pub smile_ratio: f64,
    pub mouth_open_ratio: f64,
    pub jaw_drop_ratio: f64,
    pub cheek_lift_ratio: f64,
    pub symmetry_score: f64,
}

impl Default for MovementFeatureVector {
    fn default() -> Self {
        Self {
            smile_ratio: 0.0,
            mouth_open_ratio: 0.0,
            jaw_drop_ratio: 0.0,
            cheek_lift_ratio: 0.0,
            symmetry_score: 0.5,
        }
    }
}

/// The four features a movement can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetFeature {
    SmileRatio,
    MouthOpenRatio,
    JawDropRatio,
    CheekLiftRatio,
}

impl MovementFeatureVector {
    pub fn get(&self, feature: TargetFeature) -> f64 {
        match feature {
            TargetFeature::SmileRatio => self.smile_ratio,
            TargetFeature::MouthOpenRatio => self.mouth_open_ratio,
            TargetFeature::JawDropRatio => self.jaw_drop_ratio,
            TargetFeature::CheekLiftRatio => self.cheek_lift_ratio,
        }
    }
}

/// Per-feature range of motion observed during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRange {
    pub smile_ratio: f64,
    pub mouth_open_ratio: f64,
    pub jaw_drop_ratio: f64,
    pub cheek_lift_ratio: f64,
}

impl FeatureRange {
    pub fn get(&self, feature: TargetFeature) -> f64 {
        match feature {
            TargetFeature::SmileRatio => self.smile_ratio,
            TargetFeature::MouthOpenRatio => self.mouth_open_ratio,
            TargetFeature::JawDropRatio => self.jaw_drop_ratio,
            TargetFeature::CheekLiftRatio => self.cheek_lift_ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation output
// ---------------------------------------------------------------------------

/// Telemetry-oriented details about how a frame was judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDebug {
    pub model_version: String,
    pub used_landmarks: bool,
    pub measured_value: f64,
    pub hysteresis_applied: bool,
    pub notes: Vec<String>,
}

/// Per-frame coaching verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvaluation {
    pub movement_id: String,
    pub status_color: StatusColor,
    pub accuracy: f64,
    pub confidence: f64,
    pub error_reasons: Vec<String>,
    pub audio_cue: String,
    pub visual_cue: String,
    pub phase: SessionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<EvaluationDebug>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn require_finite(field: &str, value: f64) -> Result<(), CoreError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{field} must be a finite number"
        )))
    }
}

/// Reject quality inputs carrying NaN or infinite metrics.
pub fn validate_quality_input(input: &QualityInput) -> Result<(), CoreError> {
    require_finite("quality.brightness", input.brightness)?;
    require_finite("quality.blur", input.blur)?;
    require_finite("quality.faceCoverage", input.face_coverage)?;
    require_finite("quality.headYawDeg", input.head_yaw_deg)?;
    require_finite("quality.occlusion", input.occlusion)?;
    require_finite("quality.fps", input.fps)?;
    if input.fps < 0.0 {
        return Err(CoreError::Validation(format!(
            "quality.fps must be >= 0, got {}",
            input.fps
        )));
    }
    Ok(())
}

/// Reject landmark arrays containing non-finite coordinates.
pub fn validate_landmarks(points: &[Point3D]) -> Result<(), CoreError> {
    for (i, p) in points.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(CoreError::Validation(format!(
                "landmarks[{i}] must have finite coordinates"
            )));
        }
    }
    Ok(())
}

/// A device profile needs a platform, a user agent and real video dimensions.
pub fn validate_device_profile(profile: &DeviceProfile) -> Result<(), CoreError> {
    if profile.platform.trim().is_empty() {
        return Err(CoreError::Validation(
            "deviceProfile.platform is required".into(),
        ));
    }
    if profile.user_agent.trim().is_empty() {
        return Err(CoreError::Validation(
            "deviceProfile.userAgent is required".into(),
        ));
    }
    require_finite("deviceProfile.videoWidth", profile.video_width)?;
    require_finite("deviceProfile.videoHeight", profile.video_height)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn good_input() -> QualityInput {
        QualityInput {
            brightness: 0.6,
            blur: 0.8,
            face_coverage: 0.24,
            head_yaw_deg: 2.0,
            occlusion: 0.1,
            fps: 24.0,
            face_signal: None,
        }
    }

    #[test]
    fn distance_bucket_boundaries() {
        assert_eq!(distance_bucket(0.35), DistanceBucket::Near);
        assert_eq!(distance_bucket(0.30), DistanceBucket::Near);
        assert_eq!(distance_bucket(0.2), DistanceBucket::Mid);
        assert_eq!(distance_bucket(0.05), DistanceBucket::Far);
    }

    #[test]
    fn lenient_parsers_fall_back() {
        assert_eq!(SessionPhase::parse_or_default("hold"), SessionPhase::Hold);
        assert_eq!(SessionPhase::parse_or_default("bogus"), SessionPhase::Prepare);
        assert_eq!(StatusColor::parse_or_default("red"), StatusColor::Red);
        assert_eq!(StatusColor::parse_or_default(""), StatusColor::Yellow);
    }

    #[test]
    fn quality_level_orders_worst_first() {
        assert!(QualityLevel::Poor < QualityLevel::Fair);
        assert!(QualityLevel::Fair < QualityLevel::Good);
    }

    #[test]
    fn log_labels_match_wire_names() {
        for level in [QualityLevel::Poor, QualityLevel::Fair, QualityLevel::Good] {
            let wire = serde_json::to_value(level).unwrap();
            assert_eq!(wire, level.as_str());
        }
        for phase in [
            SessionPhase::Prepare,
            SessionPhase::Activate,
            SessionPhase::Hold,
            SessionPhase::Release,
        ] {
            assert_eq!(serde_json::to_value(phase).unwrap(), phase.as_str());
            assert_eq!(SessionPhase::parse_or_default(phase.as_str()), phase);
        }
    }

    #[test]
    fn quality_input_wire_format() {
        let json = r#"{"brightness":0.5,"blur":0.5,"faceCoverage":0.2,
            "headYawDeg":1,"occlusion":0,"fps":20,"faceSignal":"not_detected"}"#;
        let input: QualityInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.face_signal, Some(FaceSignal::NotDetected));
        assert_eq!(input.face_coverage, 0.2);
    }

    #[test]
    fn validate_quality_rejects_nan() {
        let mut input = good_input();
        assert!(validate_quality_input(&input).is_ok());
        input.fps = f64::NAN;
        assert!(validate_quality_input(&input).is_err());
    }

    #[test]
    fn validate_quality_rejects_negative_fps() {
        let mut input = good_input();
        input.fps = -1.0;
        assert!(validate_quality_input(&input).is_err());
    }

    #[test]
    fn validate_device_profile_requires_platform() {
        let profile = DeviceProfile {
            platform: " ".into(),
            user_agent: "ua".into(),
            video_width: 640.0,
            video_height: 480.0,
        };
        assert!(validate_device_profile(&profile).is_err());
    }

    #[test]
    fn validate_landmarks_rejects_infinite() {
        let points = [Point3D::new(0.0, 0.0, 0.0), Point3D::new(f64::INFINITY, 0.0, 0.0)];
        assert!(validate_landmarks(&points).is_err());
        assert!(validate_landmarks(&points[..1]).is_ok());
    }
}
