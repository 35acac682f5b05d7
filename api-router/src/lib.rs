#![allow(clippy::missing_docs_in_private_items)]

use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{
    answer::answer_question,
    context::course_context,
    documents::{
        create_document, delete_document, document_index_status, get_document,
        list_course_documents, update_document,
    },
    liveness::live,
    readiness::ready,
    upload::{upload_extract, upload_index},
};

pub mod api_state;
pub mod error;
mod routes;

/// Headroom for multipart framing on top of the configured file ceiling.
const UPLOAD_BODY_SLACK_BYTES: usize = 64 * 1024;

/// Router for the retrieval-augmented answering surface, nested by the
/// binary under `/rag`.
pub fn rag_routes<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    let upload_limit =
        DefaultBodyLimit::max(app_state.config.max_upload_bytes + UPLOAD_BODY_SLACK_BYTES);

    Router::new()
        .route("/answer", post(answer_question))
        .route("/context/{course_id}", get(course_context))
        .route("/documents", post(create_document))
        .route(
            "/documents/{id}",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route("/documents/{id}/index-status", get(document_index_status))
        .route("/documents/course/{course_id}", get(list_course_documents))
        .route(
            "/documents/upload/extract",
            post(upload_extract).layer(upload_limit.clone()),
        )
        .route(
            "/documents/upload/index",
            post(upload_index).layer(upload_limit),
        )
}

/// Public, unauthenticated probe endpoints (for k8s/systemd probes).
pub fn probe_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live))
}
