#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod extraction;
pub mod orchestrator;
pub mod remote_store;
pub mod upload;

pub use extraction::{PdfTextExtractor, TextExtractor};
pub use orchestrator::{IngestMode, IngestOutcome, IngestionPipeline};
pub use remote_store::{RemoteFile, RemoteIngestion, VectorStoreClient, VectorStoreFile};
pub use upload::UploadSession;
