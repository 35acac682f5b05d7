use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(Level, "level", {
    set_id: String,
    title: String,
    position: u32
});

// Levels are written by the surrounding platform; this subsystem only reads
// them. The batched reader covers a whole course worth of sets in one query.
impl Level {
    pub fn new(set_id: String, title: String, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            set_id,
            title,
            position,
        }
    }

    pub async fn list_by_sets(
        set_ids: &[String],
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        if set_ids.is_empty() {
            return Ok(Vec::new());
        }

        let levels = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE set_id IN $set_ids ORDER BY position ASC",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("set_ids", set_ids.to_vec()))
            .await?
            .take(0)?;

        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_by_sets_spans_multiple_parents() {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb");

        for (set_id, title, position) in [
            ("set-a", "a2", 2),
            ("set-a", "a1", 1),
            ("set-b", "b1", 1),
            ("set-c", "excluded", 1),
        ] {
            db.store_item(Level::new(set_id.to_owned(), title.to_owned(), position))
                .await
                .expect("Failed to store level");
        }

        let levels = Level::list_by_sets(&["set-a".to_owned(), "set-b".to_owned()], &db)
            .await
            .expect("Failed to list levels");

        assert_eq!(levels.len(), 3);
        assert!(levels.iter().all(|level| level.set_id != "set-c"));

        let empty = Level::list_by_sets(&[], &db)
            .await
            .expect("Failed to list levels");
        assert!(empty.is_empty());
    }
}
