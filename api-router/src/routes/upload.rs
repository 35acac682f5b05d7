use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tracing::info;

use ingestion_pipeline::{IngestMode, IngestOutcome, UploadSession};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    pub course_id: String,
    pub title: Option<String>,
    // The transport ceiling is enforced by the route's body limit and the
    // orchestrator's size check.
    #[form_data(limit = "unlimited")]
    pub file: FieldData<NamedTempFile>,
}

/// Local-extraction branch: the PDF's text is extracted and stored on the
/// document.
pub async fn upload_extract(
    State(state): State<ApiState>,
    TypedMultipart(params): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    ingest(state, params, IngestMode::Extract).await
}

/// Remote-ingestion branch: the PDF is uploaded and attached to the
/// retrieval index.
pub async fn upload_index(
    State(state): State<ApiState>,
    TypedMultipart(params): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    ingest(state, params, IngestMode::Index).await
}

async fn ingest(
    state: ApiState,
    params: UploadParams,
    mode: IngestMode,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = UploadSession::from_field(params.file, params.course_id, params.title)?;

    info!(
        file_name = %session.file_name,
        course_id = %session.course_id,
        "Received document upload"
    );

    let outcome = state.ingestion.ingest_upload(session, mode).await?;

    let response = match outcome {
        IngestOutcome::Extracted { document } => {
            (StatusCode::CREATED, Json(json!({ "document": document })))
        }
        IngestOutcome::Indexed {
            document_id,
            remote_file,
            attachment,
        } => (
            StatusCode::CREATED,
            Json(json!({
                "document_id": document_id,
                "remote_file": remote_file,
                "attachment": attachment,
            })),
        ),
        IngestOutcome::AlreadyIndexed { document } => (
            StatusCode::OK,
            Json(json!({
                "document_id": document.id,
                "status": "already_indexed",
            })),
        ),
    };

    Ok(response)
}
