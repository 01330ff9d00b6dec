//! Stateless camera-quality scoring.

use axum::response::IntoResponse;
use axum::Json;
use facecoach_core::quality::{evaluate_quality, recommended_calibration_seconds};
use facecoach_core::types::{validate_quality_input, QualityInput, QualityScore};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityEvaluation {
    #[serde(flatten)]
    pub score: QualityScore,
    pub recommended_calibration_sec: u32,
}

/// POST /api/v1/quality/evaluate
pub async fn evaluate(
    _user: AuthUser,
    Json(input): Json<QualityInput>,
) -> AppResult<impl IntoResponse> {
    validate_quality_input(&input)?;
    let score = evaluate_quality(&input);
    let recommended_calibration_sec = recommended_calibration_seconds(score.level);
    Ok(Json(DataResponse {
        data: QualityEvaluation {
            score,
            recommended_calibration_sec,
        },
    }))
}
