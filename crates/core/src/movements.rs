//! Static movement catalog and expert reference profiles.

use serde::Serialize;

use crate::types::TargetFeature;

/// Catalog entry for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub target_min: f64,
    pub target_max: f64,
    pub hold_sec: f64,
    pub reps: u32,
    pub rest_sec: f64,
}

/// Expert demonstration and the landmark feature a movement is judged on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementReferenceProfile {
    pub movement_id: &'static str,
    pub title: &'static str,
    pub video_url: &'static str,
    pub guidance: &'static [&'static str],
    pub target_feature: TargetFeature,
    pub model_version: &'static str,
}

pub const MOVEMENT_CHEEK_LIFT: &str = "cheek-lift";
pub const MOVEMENT_JAW_RELEASE: &str = "jaw-release";

/// Landmark rule set the reference profiles were authored against.
pub const REFERENCE_MODEL_VERSION: &str = "landmark-rule-v2";

pub const MOVEMENTS: &[MovementDefinition] = &[
    MovementDefinition {
        id: MOVEMENT_CHEEK_LIFT,
        name: "Cheek Lift",
        description: "Lift the smile muscles upward in a controlled way and hold.",
        target_min: 0.97,
        target_max: 1.08,
        hold_sec: 6.0,
        reps: 6,
        rest_sec: 4.0,
    },
    MovementDefinition {
        id: MOVEMENT_JAW_RELEASE,
        name: "Jaw Release",
        description: "Relax the jaw muscles and open and close rhythmically.",
        target_min: 0.9,
        target_max: 1.08,
        hold_sec: 4.0,
        reps: 8,
        rest_sec: 3.0,
    },
];

const REFERENCE_VIDEO_URL: &str =
    "https://interactive-examples.mdn.mozilla.net/media/cc0-videos/flower.mp4";

pub const MOVEMENT_REFERENCE_PROFILES: &[MovementReferenceProfile] = &[
    MovementReferenceProfile {
        movement_id: MOVEMENT_CHEEK_LIFT,
        title: "Cheek Lift - Expert Form",
        video_url: REFERENCE_VIDEO_URL,
        guidance: &[
            "Gently raise the corners of the lips.",
            "Keep the cheeks symmetric and avoid locking the jaw.",
            "Hold the pose without holding your breath.",
        ],
        target_feature: TargetFeature::CheekLiftRatio,
        model_version: REFERENCE_MODEL_VERSION,
    },
    MovementReferenceProfile {
        movement_id: MOVEMENT_JAW_RELEASE,
        title: "Jaw Release - Expert Form",
        video_url: REFERENCE_VIDEO_URL,
        guidance: &[
            "Lower the jaw slowly and under control.",
            "Do not tense the neck muscles.",
            "Keep the rhythm steady between repetitions.",
        ],
        target_feature: TargetFeature::JawDropRatio,
        model_version: REFERENCE_MODEL_VERSION,
    },
];

pub fn movement_by_id(id: &str) -> Option<&'static MovementDefinition> {
    MOVEMENTS.iter().find(|m| m.id == id)
}

pub fn reference_profile(movement_id: &str) -> Option<&'static MovementReferenceProfile> {
    MOVEMENT_REFERENCE_PROFILES
        .iter()
        .find(|p| p.movement_id == movement_id)
}

/// Movement used when a session is started without an explicit selection.
pub fn default_movement() -> &'static MovementDefinition {
    &MOVEMENTS[0]
}
