use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(QuestionSet, "question_set", {
    course_id: String,
    title: String,
    description: String,
    position: u32
});

// Question sets are written by the surrounding platform; this subsystem only
// reads them in curriculum order.
impl QuestionSet {
    pub fn new(course_id: String, title: String, description: String, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            course_id,
            title,
            description,
            position,
        }
    }

    pub async fn list_by_course(
        course_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let sets = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE course_id = $course_id ORDER BY position ASC",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("course_id", course_id.to_owned()))
            .await?
            .take(0)?;

        Ok(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_by_course_in_position_order() {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb");

        for (title, position) in [("second", 2), ("first", 1)] {
            db.store_item(QuestionSet::new(
                "course-1".to_owned(),
                title.to_owned(),
                String::new(),
                position,
            ))
            .await
            .expect("Failed to store set");
        }
        db.store_item(QuestionSet::new(
            "course-2".to_owned(),
            "other".to_owned(),
            String::new(),
            1,
        ))
        .await
        .expect("Failed to store set");

        let sets = QuestionSet::list_by_course("course-1", &db)
            .await
            .expect("Failed to list sets");

        let titles: Vec<&str> = sets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
