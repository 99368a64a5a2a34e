use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::database::models::{Letter, Letterhead};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::letter::{CreateLetter, CreateLetterhead, LetterDetail};
use crate::types::Identity;

/// GET /api/letters
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Vec<Letter>> {
    let letters = state.letters().find_all(&identity).await?;
    Ok(ApiResponse::success(letters))
}

/// GET /api/letters/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<LetterDetail> {
    let detail = state.letters().find_one(&identity, id).await?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/letters
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateLetter>,
) -> ApiResult<LetterDetail> {
    let created = state.letters().create(&identity, body).await?;
    Ok(ApiResponse::created(created))
}

/// POST /api/letterheads
pub async fn create_letterhead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateLetterhead>,
) -> ApiResult<Letterhead> {
    let created = state.letters().create_letterhead(&identity, body).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/letterheads/:id
pub async fn get_letterhead(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Letterhead> {
    let letterhead = state.letters().find_letterhead(&identity, id).await?;
    Ok(ApiResponse::success(letterhead))
}
