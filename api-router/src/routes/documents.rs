use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use common::storage::types::{
    course::Course,
    reference_document::{DocumentSource, ReferenceDocument, ReferenceDocumentPatch},
};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub course_id: String,
    pub title: String,
    pub content: String,
}

pub async fn create_document(
    State(state): State<ApiState>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // The document must reference an existing course.
    Course::get_by_id(&request.course_id, &state.db).await?;

    let document = ReferenceDocument::create(
        &request.course_id,
        &request.title,
        DocumentSource::Local {
            text: request.content,
        },
        &state.db,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn update_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(patch): Json<ReferenceDocumentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let document = ReferenceDocument::patch(&id, patch, &state.db).await?;

    Ok(Json(document))
}

pub async fn delete_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ReferenceDocument::delete_by_id(&id, &state.db).await?;

    Ok(Json(json!({ "status": "deleted" })))
}

pub async fn get_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let document = ReferenceDocument::get_by_id(&id, &state.db).await?;

    Ok(Json(document))
}

pub async fn list_course_documents(
    State(state): State<ApiState>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = ReferenceDocument::list_by_course(&course_id, &state.db).await?;

    Ok(Json(documents))
}

/// Vector-store attachment status for a remote-sourced document.
pub async fn document_index_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = state.ingestion.index_status(&id).await?;

    Ok(Json(attachment))
}
