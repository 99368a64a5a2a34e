use axum::extract::{Path, State};

use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::render::RenderedLetter;

/// GET /letters/:token - assembled letter data for client-side rendering
pub async fn get(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<RenderedLetter> {
    let letter = state.submissions().letter_view(&token).await?;
    Ok(ApiResponse::success(letter))
}
