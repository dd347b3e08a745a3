use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hook_codegen::GeneratedArtifact;
use hook_store::CaptureId;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub webhook_ids: Vec<String>,
}

/// Generate a typed handler from the given captures.
///
/// Any well-formed UUID is accepted. Ids that match no capture are dropped by the loader.
pub async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GeneratedArtifact>), ApiError> {
    let Json(request) = payload?;

    let ids = request
        .webhook_ids
        .iter()
        .map(|id| CaptureId::parse_any(id))
        .collect::<Result<Vec<_>, _>>()?;

    let artifact = state.generator.generate(&ids).await?;

    Ok((StatusCode::CREATED, Json(artifact)))
}
