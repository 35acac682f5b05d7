use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use common::{
    error::AppError,
    utils::{
        config::UpstreamConfig,
        http::{read_upstream_json, transport_error},
    },
};

/// Vector-store endpoints still require the assistants beta header.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Metadata the external object store returns for an uploaded file. Never
/// persisted as a local row; documents reference the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteFile {
    pub id: String,
    pub filename: String,
    pub bytes: u64,
    pub created_at: i64,
    pub purpose: String,
}

/// A file's membership in a retrieval index. Fetched on demand, not cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorStoreFile {
    pub id: String,
    pub vector_store_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunking_strategy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<Value>,
}

/// Seam for the external object store and vector index. Production talks to
/// an OpenAI-compatible API; tests substitute counting fakes.
#[async_trait]
pub trait RemoteIngestion: Send + Sync {
    async fn upload_file(
        &self,
        path: &Path,
        file_name: &str,
        purpose: &str,
    ) -> Result<RemoteFile, AppError>;

    async fn attach_to_vector_store(
        &self,
        vector_store_id: &str,
        file_id: &str,
        attributes: Option<Value>,
        chunking_strategy: Option<Value>,
    ) -> Result<VectorStoreFile, AppError>;

    async fn get_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile, AppError>;
}

/// Reqwest-backed client for the upstream file store and vector index. The
/// credential is checked per call so a missing key surfaces as a
/// configuration error on the request that needed it.
#[derive(Clone)]
pub struct VectorStoreClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl VectorStoreClient {
    pub fn new(http: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl RemoteIngestion for VectorStoreClient {
    async fn upload_file(
        &self,
        path: &Path,
        file_name: &str,
        purpose: &str,
    ) -> Result<RemoteFile, AppError> {
        let api_key = self.config.require_api_key()?;

        let bytes = tokio::fs::read(path).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(mime::APPLICATION_PDF.as_ref())
            .map_err(|err| AppError::Internal(format!("Invalid upload part: {err}")))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_owned())
            .part("file", part);

        debug!(file_name, purpose, "Uploading file to external store");

        let response = self
            .http
            .post(format!("{}/files", self.config.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        read_upstream_json(response).await
    }

    async fn attach_to_vector_store(
        &self,
        vector_store_id: &str,
        file_id: &str,
        attributes: Option<Value>,
        chunking_strategy: Option<Value>,
    ) -> Result<VectorStoreFile, AppError> {
        let api_key = self.config.require_api_key()?;

        let mut body = Map::new();
        body.insert("file_id".to_owned(), Value::String(file_id.to_owned()));
        if let Some(attributes) = attributes {
            body.insert("attributes".to_owned(), attributes);
        }
        if let Some(chunking_strategy) = chunking_strategy {
            body.insert("chunking_strategy".to_owned(), chunking_strategy);
        }

        debug!(vector_store_id, file_id, "Attaching file to vector store");

        let response = self
            .http
            .post(format!(
                "{}/vector_stores/{vector_store_id}/files",
                self.config.base_url
            ))
            .bearer_auth(api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(transport_error)?;

        read_upstream_json(response).await
    }

    async fn get_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile, AppError> {
        let api_key = self.config.require_api_key()?;

        let response = self
            .http
            .get(format!(
                "{}/vector_stores/{vector_store_id}/files/{file_id}",
                self.config.base_url
            ))
            .bearer_auth(api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .send()
            .await
            .map_err(transport_error)?;

        read_upstream_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_file_deserializes_upstream_payload() {
        let payload = r#"{
            "id": "file-abc123",
            "object": "file",
            "bytes": 120000,
            "created_at": 1677610602,
            "filename": "mechanics.pdf",
            "purpose": "assistants"
        }"#;

        let file: RemoteFile = serde_json::from_str(payload).expect("Failed to parse");
        assert_eq!(file.id, "file-abc123");
        assert_eq!(file.filename, "mechanics.pdf");
        assert_eq!(file.bytes, 120_000);
    }

    #[test]
    fn test_vector_store_file_tolerates_missing_optional_fields() {
        let payload = r#"{
            "id": "file-abc123",
            "object": "vector_store.file",
            "vector_store_id": "vs_1",
            "status": "in_progress"
        }"#;

        let attachment: VectorStoreFile = serde_json::from_str(payload).expect("Failed to parse");
        assert_eq!(attachment.status, "in_progress");
        assert!(attachment.attributes.is_none());
        assert!(attachment.chunking_strategy.is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_io() {
        let client = VectorStoreClient::new(reqwest::Client::new(), UpstreamConfig::default());

        let result = client
            .upload_file(Path::new("/nonexistent/file.pdf"), "file.pdf", "assistants")
            .await;
        assert!(matches!(result, Err(AppError::Configuration(_))));

        let result = client
            .get_vector_store_file("vs_1", "file-abc123")
            .await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
