use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use retrieval_pipeline::build_course_context;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

/// Flattened text view of a course's reference material and curriculum.
pub async fn course_context(
    State(state): State<ApiState>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let context = build_course_context(&course_id, &state.db).await?;

    Ok(Json(json!({ "context": context })))
}
