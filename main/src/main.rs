use std::sync::Arc;

use anyhow::Context;
use api_router::{api_state::ApiState, probe_routes, rag_routes};
use axum::Router;
use common::{storage::db::SurrealDbClient, utils::config::get_config};
use ingestion_pipeline::{IngestionPipeline, PdfTextExtractor, VectorStoreClient};
use retrieval_pipeline::OpenAiAnswerClient;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config().context("Failed to load configuration")?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );
    db.ensure_initialized().await?;

    // One shared HTTP client; the upstream credential and store id are
    // injected here and validated per call.
    let http = reqwest::Client::new();
    let upstream = config.upstream();

    let ingestion = Arc::new(IngestionPipeline::new(
        db.clone(),
        Arc::new(PdfTextExtractor),
        Arc::new(VectorStoreClient::new(http.clone(), upstream.clone())),
        upstream.clone(),
        config.max_upload_bytes,
    ));
    let answers = Arc::new(OpenAiAnswerClient::new(http, upstream));

    let state = ApiState::new(db, config.clone(), ingestion, answers);
    let app = build_router(state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: ApiState) -> Router {
    Router::new()
        .nest("/rag", rag_routes(&state))
        .merge(probe_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
