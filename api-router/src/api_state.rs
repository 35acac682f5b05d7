use std::sync::Arc;

use common::{storage::db::SurrealDbClient, utils::config::AppConfig};
use ingestion_pipeline::IngestionPipeline;
use retrieval_pipeline::AnswerEngine;

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub ingestion: Arc<IngestionPipeline>,
    pub answers: Arc<dyn AnswerEngine>,
}

impl ApiState {
    pub fn new(
        db: Arc<SurrealDbClient>,
        config: AppConfig,
        ingestion: Arc<IngestionPipeline>,
        answers: Arc<dyn AnswerEngine>,
    ) -> Self {
        Self {
            db,
            config,
            ingestion,
            answers,
        }
    }
}
