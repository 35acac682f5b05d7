use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub vector_store_id: Option<String>,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_answer_model")]
    pub answer_model: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_answer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl AppConfig {
    /// Snapshot of the upstream-facing settings handed to clients at
    /// construction time. Missing credentials surface per call, not at
    /// startup.
    pub fn upstream(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.openai_base_url.clone(),
            api_key: self.openai_api_key.clone(),
            vector_store_id: self.vector_store_id.clone(),
            answer_model: self.answer_model.clone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            vector_store_id: None,
            surrealdb_address: String::new(),
            surrealdb_username: String::new(),
            surrealdb_password: String::new(),
            surrealdb_namespace: String::new(),
            surrealdb_database: String::new(),
            http_port: 0,
            openai_base_url: default_base_url(),
            answer_model: default_answer_model(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub vector_store_id: Option<String>,
    pub answer_model: String,
}

impl UpstreamConfig {
    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("openai_api_key is not configured".into()))
    }

    pub fn require_vector_store_id(&self) -> Result<&str, AppError> {
        self.vector_store_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("vector_store_id is not configured".into()))
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
