use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{
    CarbonCopy, LetterAttachment, LetterSignature, Submission, SubmissionKind, SubmissionStatus,
};
use crate::error::ApiError;
use crate::handlers::{AppState, Paged};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::submission::{
    AddAttachment, CreateSubmission, ListSubmissions, SubmissionDetail, UpdateSubmission,
    VerifySubmission,
};
use crate::types::Identity;

/// GET /api/submissions
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListSubmissions>,
) -> ApiResult<Paged<Submission>> {
    let page = state.submissions().find_all(&identity, query).await?;
    Ok(ApiResponse::success(page.into()))
}

/// GET /api/submissions/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<SubmissionDetail> {
    let detail = state.submissions().find_one(&identity, id).await?;
    Ok(ApiResponse::success(detail))
}

/// POST /api/submissions/student - a student requests a letter for themselves
pub async fn create_student(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateSubmission>,
) -> ApiResult<Submission> {
    let created =
        state.submissions().create(&identity, SubmissionKind::Student, body).await?;
    Ok(ApiResponse::created(created))
}

/// POST /api/submissions/general - staff issue a letter on behalf of anyone
pub async fn create_general(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateSubmission>,
) -> ApiResult<Submission> {
    let created =
        state.submissions().create(&identity, SubmissionKind::General, body).await?;
    Ok(ApiResponse::created(created))
}

/// PATCH /api/submissions/:id - amend answers / replace documents
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSubmission>,
) -> ApiResult<Submission> {
    let updated = state.submissions().update(&identity, id, body).await?;
    Ok(ApiResponse::success(updated))
}

/// POST /api/submissions/:id/verify - staff review gate
pub async fn verify(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<VerifySubmission>,
) -> ApiResult<Submission> {
    let verified = state.submissions().verify(&identity, id, body).await?;
    Ok(ApiResponse::success(verified))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatus {
    pub status: SubmissionStatus,
}

/// PATCH /api/submissions/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeStatus>,
) -> ApiResult<Submission> {
    let updated = state.submissions().change_status(&identity, id, body.status).await?;
    Ok(ApiResponse::success(updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCarbonCopy {
    pub carbon_copy: Option<CarbonCopy>,
}

/// PATCH /api/submissions/:id/carbon-copy
pub async fn set_carbon_copy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetCarbonCopy>,
) -> ApiResult<Submission> {
    let updated =
        state.submissions().update_carbon_copy(&identity, id, body.carbon_copy).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/submissions/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.submissions().remove(&identity, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /api/submissions/:id/attachments - append a supplementary page
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddAttachment>,
) -> ApiResult<LetterAttachment> {
    let created = state.submissions().add_attachment(&identity, id, body).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/submissions/:id/print - final HTML for printing
pub async fn print(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let html = state.submissions().print_html(&identity, id).await?;
    Ok(Html(html))
}

/// GET /api/submissions/:id/signatures - collection progress
pub async fn signatures(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LetterSignature>> {
    let slots = state.signatures().for_submission(&identity, id).await?;
    Ok(ApiResponse::success(slots))
}

/// POST /api/signatures/:id/reset - clear a mark and rotate the code
pub async fn reset_signature(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<LetterSignature> {
    let reset = state.signatures().reset(&identity, id).await?;
    Ok(ApiResponse::success(reset))
}
