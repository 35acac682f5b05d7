use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(Course, "course", {
    title: String,
    description: String
});

// Courses are written by the surrounding platform; this subsystem only reads
// them.
impl Course {
    pub fn new(title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            title,
            description,
        }
    }

    pub async fn get_by_id(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        db.get_item::<Self>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {id} was not found")))
    }
}
