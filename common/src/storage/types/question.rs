use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(Question, "question", {
    level_id: String,
    prompt: String,
    answer: String,
    explanation: Option<String>,
    position: u32
});

// Questions are written by the surrounding platform; this subsystem only
// reads them. The batched reader covers a whole course worth of levels in one
// query.
impl Question {
    pub fn new(
        level_id: String,
        prompt: String,
        answer: String,
        explanation: Option<String>,
        position: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            level_id,
            prompt,
            answer,
            explanation,
            position,
        }
    }

    pub async fn list_by_levels(
        level_ids: &[String],
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        if level_ids.is_empty() {
            return Ok(Vec::new());
        }

        let questions = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE level_id IN $level_ids ORDER BY position ASC",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("level_ids", level_ids.to_vec()))
            .await?
            .take(0)?;

        Ok(questions)
    }
}
