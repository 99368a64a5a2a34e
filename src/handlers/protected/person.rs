use axum::extract::State;
use axum::{Extension, Json};

use crate::database::models::{Official, Personnel, Student};
use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::person::{CreateOfficial, CreatePersonnel, CreateStudent};
use crate::types::Identity;

/// POST /api/officials
pub async fn create_official(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateOfficial>,
) -> ApiResult<Official> {
    let created = state.people().create_official(&identity, body).await?;
    Ok(ApiResponse::created(created))
}

/// POST /api/students
pub async fn create_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateStudent>,
) -> ApiResult<Student> {
    let created = state.people().create_student(&identity, body).await?;
    Ok(ApiResponse::created(created))
}

/// POST /api/personnel
pub async fn create_personnel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreatePersonnel>,
) -> ApiResult<Personnel> {
    let created = state.people().create_personnel(&identity, body).await?;
    Ok(ApiResponse::created(created))
}
