use axum::{extract::State, response::IntoResponse, Json};
use retrieval_pipeline::AnswerOutcome;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub course_id: String,
    pub question: String,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Answers a free-form question grounded in the course's indexed material.
/// When the upstream payload shape is unrecognized the raw payload is
/// returned under `raw_response`.
pub async fn answer_question(
    State(state): State<ApiState>,
    Json(request): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.course_id.trim().is_empty() {
        return Err(ApiError::ValidationError("A course id is required".into()));
    }
    if request.question.trim().is_empty() {
        return Err(ApiError::ValidationError("A question is required".into()));
    }

    info!(course_id = %request.course_id, "Received answer request");

    let outcome = state
        .answers
        .answer_question(
            &request.course_id,
            &request.question,
            request.additional_context.as_deref(),
            request.file_id.as_deref(),
        )
        .await?;

    let body = match outcome {
        AnswerOutcome::Answered(answer) => json!({
            "answer": answer.text,
            "citations": answer.citations,
        }),
        AnswerOutcome::Unrecognized { raw } => json!({ "raw_response": raw }),
    };

    Ok(Json(body))
}
