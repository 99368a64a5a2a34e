use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::LetterSignature;
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::signature::SignatureView;

/// GET /sign/:token - resolve a signatory link to its slot
pub async fn get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<SignatureView> {
    let view = state.signatures().find_by_token(&token).await?;
    Ok(ApiResponse::success(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMark {
    pub signature: String,
}

/// POST /sign/:id/mark - record the signatory's mark
pub async fn post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<SubmitMark>,
) -> ApiResult<LetterSignature> {
    let signed = state.signatures().submit_mark(id, &body.signature).await?;
    Ok(ApiResponse::success(signed))
}
