use surrealdb::opt::PatchOp;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

/// Where a document's material lives. Authored and extracted text is held
/// locally; uploaded files live in the external store and are referenced by
/// their remote identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DocumentSource {
    Local {
        text: String,
    },
    Remote {
        file_id: String,
        file_name: String,
        sha256: String,
    },
}

/// Partial update for a document. Only supplied fields are merged; a
/// supplied `content` replaces the source with local text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceDocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub active: Option<bool>,
}

stored_object!(ReferenceDocument, "reference_document", {
    course_id: String,
    title: String,
    source: DocumentSource,
    active: bool
});

impl ReferenceDocument {
    pub fn new(course_id: String, title: String, source: DocumentSource) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            course_id,
            title,
            source,
            active: true,
        }
    }

    /// Validates and stores a new document with `active = true`.
    pub async fn create(
        course_id: &str,
        title: &str,
        source: DocumentSource,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        if title.trim().is_empty() {
            return Err(AppError::Validation(
                "Document title must not be empty".into(),
            ));
        }
        match &source {
            DocumentSource::Local { text } if text.trim().is_empty() => {
                return Err(AppError::Validation(
                    "Document content must not be empty".into(),
                ));
            }
            DocumentSource::Remote { file_id, .. } if file_id.trim().is_empty() => {
                return Err(AppError::Validation(
                    "Remote document is missing a file id".into(),
                ));
            }
            _ => {}
        }

        let document = Self::new(course_id.to_owned(), title.to_owned(), source);

        db.store_item(document)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to store reference document".into()))
    }

    /// Merges only the supplied fields into an existing document and bumps
    /// `updated_at`.
    pub async fn patch(
        id: &str,
        patch: ReferenceDocumentPatch,
        db: &SurrealDbClient,
    ) -> Result<Self, AppError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation(
                    "Document title must not be empty".into(),
                ));
            }
        }
        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(AppError::Validation(
                    "Document content must not be empty".into(),
                ));
            }
        }

        // Resolve first so an unknown id surfaces as NotFound rather than a
        // silent no-op.
        Self::get_by_id(id, db).await?;

        let now = Utc::now();
        let mut request = db
            .update((Self::table_name(), id))
            .patch(PatchOp::replace(
                "/updated_at",
                surrealdb::sql::Datetime::from(now),
            ));

        if let Some(title) = patch.title {
            request = request.patch(PatchOp::replace("/title", title));
        }
        if let Some(content) = patch.content {
            request = request.patch(PatchOp::replace(
                "/source",
                DocumentSource::Local { text: content },
            ));
        }
        if let Some(active) = patch.active {
            request = request.patch(PatchOp::replace("/active", active));
        }

        let updated: Option<Self> = request.await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Document {id} was not found")))
    }

    pub async fn get_by_id(id: &str, db: &SurrealDbClient) -> Result<Self, AppError> {
        db.get_item::<Self>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} was not found")))
    }

    pub async fn delete_by_id(id: &str, db: &SurrealDbClient) -> Result<(), AppError> {
        let removed: Option<Self> = db.delete_item(id).await?;

        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Document {id} was not found"))),
        }
    }

    /// All documents of a course, most recently updated first.
    pub async fn list_by_course(
        course_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let documents = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE course_id = $course_id ORDER BY updated_at DESC",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("course_id", course_id.to_owned()))
            .await?
            .take(0)?;

        Ok(documents)
    }

    /// Active documents of a course, most recently updated first.
    pub async fn list_active_by_course(
        course_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        let documents = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE course_id = $course_id AND active = true ORDER BY updated_at DESC",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("course_id", course_id.to_owned()))
            .await?
            .take(0)?;

        Ok(documents)
    }

    /// Looks for an active remote-sourced document of the same course whose
    /// upload checksum matches. Best-effort duplicate suppression, not a
    /// concurrency guarantee.
    pub async fn find_remote_duplicate(
        course_id: &str,
        sha256: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        let mut response = db
            .client
            .query(
                "SELECT * FROM type::table($table_name) WHERE course_id = $course_id AND active = true AND source.kind = 'remote' AND source.sha256 = $sha256 LIMIT 1",
            )
            .bind(("table_name", Self::table_name()))
            .bind(("course_id", course_id.to_owned()))
            .bind(("sha256", sha256.to_owned()))
            .await?;

        let existing: Vec<Self> = response.take(0)?;

        Ok(existing.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    fn local(text: &str) -> DocumentSource {
        DocumentSource::Local {
            text: text.to_owned(),
        }
    }

    fn remote(file_id: &str, sha256: &str) -> DocumentSource {
        DocumentSource::Remote {
            file_id: file_id.to_owned(),
            file_name: "notes.pdf".to_owned(),
            sha256: sha256.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrip() {
        let db = memory_db().await;

        let created =
            ReferenceDocument::create("course-1", "Week 1 notes", local("Newton's laws"), &db)
                .await
                .expect("Failed to create document");

        assert!(created.active);
        assert_eq!(created.title, "Week 1 notes");

        let fetched = ReferenceDocument::get_by_id(&created.id, &db)
            .await
            .expect("Failed to fetch document");
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.source, created.source);
        assert_eq!(fetched.course_id, "course-1");
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let db = memory_db().await;

        let empty_title = ReferenceDocument::create("course-1", "  ", local("text"), &db).await;
        assert!(matches!(empty_title, Err(AppError::Validation(_))));

        let empty_content = ReferenceDocument::create("course-1", "Title", local(" \n "), &db).await;
        assert!(matches!(empty_content, Err(AppError::Validation(_))));

        let empty_file_id =
            ReferenceDocument::create("course-1", "Title", remote("", "sha"), &db).await;
        assert!(matches!(empty_file_id, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_patch_merges_only_supplied_fields() {
        let db = memory_db().await;

        let created = ReferenceDocument::create("course-1", "Original", local("original text"), &db)
            .await
            .expect("Failed to create document");

        let patched = ReferenceDocument::patch(
            &created.id,
            ReferenceDocumentPatch {
                title: Some("Renamed".to_owned()),
                ..Default::default()
            },
            &db,
        )
        .await
        .expect("Failed to patch document");

        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.source, created.source);
        assert!(patched.active);
        assert!(patched.updated_at > created.updated_at);

        let deactivated = ReferenceDocument::patch(
            &created.id,
            ReferenceDocumentPatch {
                active: Some(false),
                ..Default::default()
            },
            &db,
        )
        .await
        .expect("Failed to patch active flag");

        assert_eq!(deactivated.title, "Renamed");
        assert!(!deactivated.active);
    }

    #[tokio::test]
    async fn test_patch_content_replaces_source() {
        let db = memory_db().await;

        let created = ReferenceDocument::create(
            "course-1",
            "Uploaded",
            remote("file-123", "deadbeef"),
            &db,
        )
        .await
        .expect("Failed to create document");

        let patched = ReferenceDocument::patch(
            &created.id,
            ReferenceDocumentPatch {
                content: Some("manually corrected text".to_owned()),
                ..Default::default()
            },
            &db,
        )
        .await
        .expect("Failed to patch content");

        assert_eq!(
            patched.source,
            DocumentSource::Local {
                text: "manually corrected text".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_patch_unknown_id_fails_not_found() {
        let db = memory_db().await;

        let result = ReferenceDocument::patch(
            "missing",
            ReferenceDocumentPatch {
                title: Some("Renamed".to_owned()),
                ..Default::default()
            },
            &db,
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let db = memory_db().await;

        let created = ReferenceDocument::create("course-1", "Doomed", local("text"), &db)
            .await
            .expect("Failed to create document");

        ReferenceDocument::delete_by_id(&created.id, &db)
            .await
            .expect("Failed to delete document");

        let fetched = ReferenceDocument::get_by_id(&created.id, &db).await;
        assert!(matches!(fetched, Err(AppError::NotFound(_))));

        let missing = ReferenceDocument::delete_by_id("missing", &db).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_course_orders_by_recency() {
        let db = memory_db().await;

        let base = Utc::now();
        for (idx, title) in ["oldest", "middle", "newest"].iter().enumerate() {
            let mut document = ReferenceDocument::new(
                "course-1".to_owned(),
                (*title).to_owned(),
                local("text"),
            );
            document.created_at = base + Duration::seconds(idx as i64);
            document.updated_at = base + Duration::seconds(idx as i64);
            db.store_item(document).await.expect("Failed to store");
        }

        // A document of another course must not leak into the listing.
        db.store_item(ReferenceDocument::new(
            "course-2".to_owned(),
            "other".to_owned(),
            local("text"),
        ))
        .await
        .expect("Failed to store");

        let listed = ReferenceDocument::list_by_course("course-1", &db)
            .await
            .expect("Failed to list documents");

        let titles: Vec<&str> = listed.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive() {
        let db = memory_db().await;

        let kept = ReferenceDocument::create("course-1", "kept", local("text"), &db)
            .await
            .expect("Failed to create document");
        let retired = ReferenceDocument::create("course-1", "retired", local("text"), &db)
            .await
            .expect("Failed to create document");

        ReferenceDocument::patch(
            &retired.id,
            ReferenceDocumentPatch {
                active: Some(false),
                ..Default::default()
            },
            &db,
        )
        .await
        .expect("Failed to deactivate");

        let active = ReferenceDocument::list_active_by_course("course-1", &db)
            .await
            .expect("Failed to list active documents");

        assert_eq!(active.len(), 1);
        assert_eq!(active.first().map(|d| d.id.as_str()), Some(kept.id.as_str()));
    }

    #[tokio::test]
    async fn test_find_remote_duplicate_matches_course_and_checksum() {
        let db = memory_db().await;

        let existing = ReferenceDocument::create(
            "course-1",
            "Uploaded",
            remote("file-123", "sha-abc"),
            &db,
        )
        .await
        .expect("Failed to create document");

        let hit = ReferenceDocument::find_remote_duplicate("course-1", "sha-abc", &db)
            .await
            .expect("Failed to query duplicate");
        assert_eq!(hit.map(|d| d.id), Some(existing.id.clone()));

        let other_course = ReferenceDocument::find_remote_duplicate("course-2", "sha-abc", &db)
            .await
            .expect("Failed to query duplicate");
        assert!(other_course.is_none());

        let other_sha = ReferenceDocument::find_remote_duplicate("course-1", "sha-zzz", &db)
            .await
            .expect("Failed to query duplicate");
        assert!(other_sha.is_none());

        ReferenceDocument::patch(
            &existing.id,
            ReferenceDocumentPatch {
                active: Some(false),
                ..Default::default()
            },
            &db,
        )
        .await
        .expect("Failed to deactivate");

        let inactive = ReferenceDocument::find_remote_duplicate("course-1", "sha-abc", &db)
            .await
            .expect("Failed to query duplicate");
        assert!(inactive.is_none());
    }
}
