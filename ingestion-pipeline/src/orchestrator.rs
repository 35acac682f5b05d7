use std::sync::Arc;

use serde_json::json;
use tracing::info;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            course::Course,
            reference_document::{DocumentSource, ReferenceDocument},
        },
    },
    utils::config::UpstreamConfig,
};

use crate::{
    extraction::TextExtractor,
    remote_store::{RemoteFile, RemoteIngestion, VectorStoreFile},
    upload::{file_sha256, UploadSession},
};

/// Purpose attached to uploads destined for the retrieval index.
const UPLOAD_PURPOSE: &str = "assistants";

/// Which ingestion branch the caller requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Extract the text locally and store it on the document.
    Extract,
    /// Upload the file and attach it to the retrieval index.
    Index,
}

/// Result of a completed ingestion run.
#[derive(Debug)]
pub enum IngestOutcome {
    Extracted {
        document: ReferenceDocument,
    },
    Indexed {
        document_id: String,
        remote_file: RemoteFile,
        attachment: VectorStoreFile,
    },
    /// An identical file was already indexed for the course; nothing was
    /// uploaded.
    AlreadyIndexed {
        document: ReferenceDocument,
    },
}

/// Per-request coordinator for uploads: validates, drives the requested
/// branch, and removes the temp file on every exit path.
pub struct IngestionPipeline {
    db: Arc<SurrealDbClient>,
    extractor: Arc<dyn TextExtractor>,
    remote: Arc<dyn RemoteIngestion>,
    upstream: UpstreamConfig,
    max_upload_bytes: usize,
}

impl IngestionPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        extractor: Arc<dyn TextExtractor>,
        remote: Arc<dyn RemoteIngestion>,
        upstream: UpstreamConfig,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            extractor,
            remote,
            upstream,
            max_upload_bytes,
        }
    }

    /// Drives one upload through validation and the requested branch.
    pub async fn ingest_upload(
        &self,
        session: UploadSession,
        mode: IngestMode,
    ) -> Result<IngestOutcome, AppError> {
        let outcome = self.run(&session, mode).await;
        session.cleanup().await;
        outcome
    }

    async fn run(
        &self,
        session: &UploadSession,
        mode: IngestMode,
    ) -> Result<IngestOutcome, AppError> {
        self.validate(session).await?;

        // Resolve the course before any upstream call is made.
        Course::get_by_id(&session.course_id, &self.db).await?;

        match mode {
            IngestMode::Extract => self.extract_locally(session).await,
            IngestMode::Index => self.index_remotely(session).await,
        }
    }

    /// Input checks, in order: declared type, size ceiling, course id. All
    /// fail before business logic touches the extractor or the network.
    async fn validate(&self, session: &UploadSession) -> Result<(), AppError> {
        if session.declared_mime != mime::APPLICATION_PDF.as_ref() {
            return Err(AppError::Validation(format!(
                "Unsupported content type {}; only PDF uploads are accepted",
                session.declared_mime
            )));
        }

        let byte_len = session.byte_len().await?;
        if byte_len == 0 {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }
        if byte_len > self.max_upload_bytes as u64 {
            return Err(AppError::Validation(format!(
                "File exceeds the upload limit of {} bytes",
                self.max_upload_bytes
            )));
        }

        if session.course_id.trim().is_empty() {
            return Err(AppError::Validation("A course id is required".into()));
        }

        Ok(())
    }

    async fn extract_locally(&self, session: &UploadSession) -> Result<IngestOutcome, AppError> {
        let bytes = tokio::fs::read(session.path()).await?;
        let text = self.extractor.extract_text(bytes).await?;

        let document = ReferenceDocument::create(
            &session.course_id,
            &session.document_title(),
            DocumentSource::Local { text },
            &self.db,
        )
        .await?;

        info!(
            document_id = %document.id,
            course_id = %session.course_id,
            "Stored extracted document"
        );

        Ok(IngestOutcome::Extracted { document })
    }

    async fn index_remotely(&self, session: &UploadSession) -> Result<IngestOutcome, AppError> {
        let vector_store_id = self.upstream.require_vector_store_id()?.to_owned();

        let sha256 = file_sha256(session.path()).await?;
        if let Some(existing) =
            ReferenceDocument::find_remote_duplicate(&session.course_id, &sha256, &self.db).await?
        {
            info!(
                document_id = %existing.id,
                course_id = %session.course_id,
                "Identical file already indexed for course; skipping upload"
            );
            return Ok(IngestOutcome::AlreadyIndexed { document: existing });
        }

        let remote_file = self
            .remote
            .upload_file(session.path(), &session.file_name, UPLOAD_PURPOSE)
            .await?;

        // If the attach fails, the uploaded file stays behind in the external
        // store; there is no automatic removal.
        let attributes = json!({
            "course_id": session.course_id,
            "file_id": remote_file.id,
        });
        let attachment = self
            .remote
            .attach_to_vector_store(&vector_store_id, &remote_file.id, Some(attributes), None)
            .await?;

        let document = ReferenceDocument::create(
            &session.course_id,
            &session.document_title(),
            DocumentSource::Remote {
                file_id: remote_file.id.clone(),
                file_name: session.file_name.clone(),
                sha256,
            },
            &self.db,
        )
        .await?;

        info!(
            document_id = %document.id,
            remote_file_id = %remote_file.id,
            course_id = %session.course_id,
            "Indexed document in vector store"
        );

        Ok(IngestOutcome::Indexed {
            document_id: document.id,
            remote_file,
            attachment,
        })
    }

    /// Attachment status of a remote-sourced document's file.
    pub async fn index_status(&self, document_id: &str) -> Result<VectorStoreFile, AppError> {
        let document = ReferenceDocument::get_by_id(document_id, &self.db).await?;

        let DocumentSource::Remote { file_id, .. } = document.source else {
            return Err(AppError::Validation(
                "Document is not backed by an indexed file".into(),
            ));
        };

        let vector_store_id = self.upstream.require_vector_store_id()?;
        self.remote
            .get_vector_store_file(vector_store_id, &file_id)
            .await
    }
}
