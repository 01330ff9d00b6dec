//! Static movement catalog.

use axum::response::IntoResponse;
use axum::Json;
use facecoach_core::movements::{
    reference_profile, MovementDefinition, MovementReferenceProfile, MOVEMENTS,
};
use serde::Serialize;

use crate::response::DataResponse;

/// A catalog movement with its expert demonstration, if one exists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementCatalogEntry {
    #[serde(flatten)]
    pub movement: &'static MovementDefinition,
    pub reference: Option<&'static MovementReferenceProfile>,
}

/// GET /api/v1/reference/movements
///
/// Public; no identity required.
pub async fn list_movements() -> impl IntoResponse {
    let entries: Vec<MovementCatalogEntry> = MOVEMENTS
        .iter()
        .map(|movement| MovementCatalogEntry {
            movement,
            reference: reference_profile(movement.id),
        })
        .collect();
    Json(DataResponse { data: entries })
}
