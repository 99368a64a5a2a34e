use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::models::Institution;
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::institution::CreateInstitution;
use crate::types::Identity;

/// GET /api/institutions
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Institution>> {
    let institutions = state.institutions().find_all(&identity).await?;
    Ok(ApiResponse::success(institutions))
}

/// GET /api/institutions/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Institution> {
    let institution = state.institutions().find_one(id).await?;
    Ok(ApiResponse::success(institution))
}

/// POST /api/institutions - admin only
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateInstitution>,
) -> ApiResult<Institution> {
    let created = state.institutions().create(&identity, body).await?;
    Ok(ApiResponse::created(created))
}
