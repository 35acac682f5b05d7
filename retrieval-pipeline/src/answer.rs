use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use common::{
    error::AppError,
    utils::{
        config::UpstreamConfig,
        http::{read_upstream_json, transport_error},
    },
};

/// A grounded pointer from answer text back to a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileCitation {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<FileCitation>,
}

/// Outcome of one answering call.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    Answered(Answer),
    /// The upstream payload carried no recognizable message/output_text
    /// block; the raw payload is handed back instead of a synthesized
    /// answer.
    Unrecognized { raw: Value },
}

/// Seam for the external answering service; tests substitute fakes.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    async fn answer_question(
        &self,
        course_id: &str,
        question: &str,
        additional_context: Option<&str>,
        file_id: Option<&str>,
    ) -> Result<AnswerOutcome, AppError>;
}

/// Client for an OpenAI-compatible generation endpoint with a retrieval tool
/// bound to the configured vector store. Credential and store id are checked
/// per call.
#[derive(Clone)]
pub struct OpenAiAnswerClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl OpenAiAnswerClient {
    pub fn new(http: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl AnswerEngine for OpenAiAnswerClient {
    async fn answer_question(
        &self,
        course_id: &str,
        question: &str,
        additional_context: Option<&str>,
        file_id: Option<&str>,
    ) -> Result<AnswerOutcome, AppError> {
        let api_key = self.config.require_api_key()?;
        let vector_store_id = self.config.require_vector_store_id()?;

        let prompt = build_question_prompt(course_id, question, additional_context);
        let body = json!({
            "model": self.config.answer_model,
            "input": prompt,
            "tools": [file_search_tool(vector_store_id, course_id, file_id)],
        });

        debug!(course_id, "Requesting grounded answer");

        let response = self
            .http
            .post(format!("{}/responses", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let payload: Value = read_upstream_json(response).await?;

        Ok(parse_answer_payload(payload))
    }
}

/// Single prompt that embeds the course id for scoping.
pub fn build_question_prompt(
    course_id: &str,
    question: &str,
    additional_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are answering a student question for course {course_id}. \
         Ground the answer in the course reference material and cite sources.\n"
    );

    if let Some(context) = additional_context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!(
            "\nAdditional context:\n==================\n{context}\n"
        ));
    }

    prompt.push_str(&format!("\nQuestion:\n==================\n{question}\n"));

    prompt
}

/// Retrieval tool bound to the configured store, scoped to the course (and
/// file, when given) via attribute filters.
fn file_search_tool(vector_store_id: &str, course_id: &str, file_id: Option<&str>) -> Value {
    let course_filter = json!({"type": "eq", "key": "course_id", "value": course_id});
    let filters = match file_id {
        Some(file_id) => json!({
            "type": "and",
            "filters": [
                course_filter,
                {"type": "eq", "key": "file_id", "value": file_id},
            ],
        }),
        None => course_filter,
    };

    json!({
        "type": "file_search",
        "vector_store_ids": [vector_store_id],
        "filters": filters,
    })
}

/// Walks the upstream output list: the entry of kind "message", its first
/// "output_text" block, and that block's "file_citation" annotations. A
/// payload without such a block is returned raw.
pub fn parse_answer_payload(payload: Value) -> AnswerOutcome {
    match extract_answer(&payload) {
        Some(answer) => AnswerOutcome::Answered(answer),
        None => AnswerOutcome::Unrecognized { raw: payload },
    }
}

fn extract_answer(payload: &Value) -> Option<Answer> {
    let block = payload
        .get("output")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("message"))?
        .get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("output_text"))?;

    let text = block
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let citations = block
        .get("annotations")
        .and_then(Value::as_array)
        .map(|annotations| {
            annotations
                .iter()
                .filter(|a| a.get("type").and_then(Value::as_str) == Some("file_citation"))
                .filter_map(|a| serde_json::from_value::<FileCitation>(a.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    Some(Answer { text, citations })
}
