//! Consent records and opt-in frame telemetry.
//!
//! Telemetry is only accepted for users who opted in. Stored samples are
//! grouped into fairness buckets (orientation x distance) so accuracy and
//! red rates can be compared across capture conditions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DistanceBucket, StatusColor, Timestamp, UserId};

/// Samples retained across all users, newest first.
pub const TELEMETRY_LIMIT: usize = 5000;

pub const DEFAULT_CONSENT_VERSION: &str = "v1";
pub const DEFAULT_LOCALE: &str = "tr-TR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConsent {
    pub user_id: UserId,
    pub telemetry_opt_in: bool,
    pub consent_version: String,
    pub locale: String,
    pub updated_at: Timestamp,
}

impl UserConsent {
    /// Opted-out consent for a user who never answered.
    pub fn default_for(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            telemetry_opt_in: false,
            consent_version: DEFAULT_CONSENT_VERSION.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            updated_at: now,
        }
    }
}

/// Body of a consent change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentUpdate {
    pub telemetry_opt_in: bool,
    pub consent_version: String,
    #[serde(default)]
    pub locale: Option<String>,
}

pub fn validate_consent_update(update: &ConsentUpdate) -> Result<(), CoreError> {
    if update.consent_version.trim().is_empty() {
        return Err(CoreError::Validation("consentVersion is required".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOrientation {
    Portrait,
    Landscape,
}

impl DeviceOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// One evaluated frame, keyed by a pseudonymous session key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFrameSample {
    pub pseudo_session_key: String,
    pub movement_id: String,
    pub model_version: String,
    pub device_orientation: DeviceOrientation,
    pub quality_overall: f64,
    pub accuracy: f64,
    pub confidence: f64,
    pub status_color: StatusColor,
    pub distance_bucket: DistanceBucket,
    pub latency_ms: f64,
    #[serde(default)]
    pub notes: Vec<String>,
}

pub fn validate_telemetry_sample(sample: &TelemetryFrameSample) -> Result<(), CoreError> {
    for (field, value) in [
        ("pseudoSessionKey", &sample.pseudo_session_key),
        ("movementId", &sample.movement_id),
        ("modelVersion", &sample.model_version),
    ] {
        if value.trim().is_empty() {
            return Err(CoreError::Validation(format!("{field} is required")));
        }
    }
    for (field, value) in [
        ("qualityOverall", sample.quality_overall),
        ("accuracy", sample.accuracy),
        ("confidence", sample.confidence),
        ("latencyMs", sample.latency_ms),
    ] {
        if !value.is_finite() {
            return Err(CoreError::Validation(format!(
                "{field} must be a finite number"
            )));
        }
    }
    Ok(())
}

/// A sample as retained by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTelemetryFrame {
    pub user_id: UserId,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub sample: TelemetryFrameSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessBucketMetrics {
    /// `orientation:distance`, e.g. `portrait:near`.
    pub bucket_id: String,
    pub sample_count: u32,
    pub average_accuracy: f64,
    pub average_confidence: f64,
    pub red_rate: f64,
}

pub fn bucket_id(orientation: DeviceOrientation, distance: DistanceBucket) -> String {
    format!("{}:{}", orientation.as_str(), distance.as_str())
}

#[derive(Debug, Default)]
struct BucketTally {
    count: u32,
    accuracy_sum: f64,
    confidence_sum: f64,
    reds: u32,
}

/// Group samples into fairness buckets, in first-seen order.
pub fn fairness_buckets<'a>(
    samples: impl IntoIterator<Item = &'a TelemetryFrameSample>,
) -> Vec<FairnessBucketMetrics> {
    let mut tallies: IndexMap<String, BucketTally> = IndexMap::new();
    for sample in samples {
        let tally = tallies
            .entry(bucket_id(sample.device_orientation, sample.distance_bucket))
            .or_default();
        tally.count += 1;
        tally.accuracy_sum += sample.accuracy;
        tally.confidence_sum += sample.confidence;
        if sample.status_color == StatusColor::Red {
            tally.reds += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(bucket_id, tally)| {
            let n = tally.count.max(1) as f64;
            FairnessBucketMetrics {
                bucket_id,
                sample_count: tally.count,
                average_accuracy: tally.accuracy_sum / n,
                average_confidence: tally.confidence_sum / n,
                red_rate: tally.reds as f64 / n,
            }
        })
        .collect()
}
