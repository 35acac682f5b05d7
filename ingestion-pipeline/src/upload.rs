use std::{
    io::{BufReader, Read},
    path::Path,
};

use axum_typed_multipart::FieldData;
use mime_guess::from_path;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::warn;

use common::error::AppError;

/// Request-scoped state for one uploaded file. The temp file must not
/// outlive the request: `cleanup` runs on every orchestrator exit path, with
/// the `NamedTempFile` drop as backstop.
pub struct UploadSession {
    temp_file: NamedTempFile,
    pub file_name: String,
    pub declared_mime: String,
    pub course_id: String,
    pub title: Option<String>,
}

impl UploadSession {
    pub fn new(
        temp_file: NamedTempFile,
        file_name: String,
        declared_mime: Option<String>,
        course_id: String,
        title: Option<String>,
    ) -> Self {
        let declared_mime =
            declared_mime.unwrap_or_else(|| Self::guess_mime_type(Path::new(&file_name)));

        Self {
            temp_file,
            file_name,
            declared_mime,
            course_id,
            title,
        }
    }

    /// Builds a session from a parsed multipart field.
    pub fn from_field(
        field: FieldData<NamedTempFile>,
        course_id: String,
        title: Option<String>,
    ) -> Result<Self, AppError> {
        let file_name = field
            .metadata
            .file_name
            .clone()
            .ok_or_else(|| AppError::Validation("Uploaded file is missing a file name".into()))?;

        Ok(Self::new(
            field.contents,
            file_name,
            field.metadata.content_type,
            course_id,
            title,
        ))
    }

    pub fn path(&self) -> &Path {
        self.temp_file.path()
    }

    pub async fn byte_len(&self) -> Result<u64, AppError> {
        let metadata = tokio::fs::metadata(self.path()).await?;
        Ok(metadata.len())
    }

    /// Title for the resulting document: the caller-supplied one when
    /// non-blank, otherwise the uploaded file name.
    pub fn document_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map_or_else(|| self.file_name.clone(), ToOwned::to_owned)
    }

    /// Idempotent check-then-delete of the temp file.
    pub async fn cleanup(self) {
        let path = self.temp_file.path().to_path_buf();
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                if let Err(err) = tokio::fs::remove_file(&path).await {
                    warn!(?path, error = %err, "Failed to remove upload temp file");
                }
            }
            Ok(false) => {}
            Err(err) => warn!(?path, error = %err, "Failed to stat upload temp file"),
        }
    }

    fn guess_mime_type(path: &Path) -> String {
        from_path(path)
            .first_or(mime::APPLICATION_OCTET_STREAM)
            .to_string()
    }
}

/// Streams the file through SHA-256 for duplicate detection.
pub async fn file_sha256(path: &Path) -> Result<String, AppError> {
    let path = path.to_path_buf();

    let digest = tokio::task::spawn_blocking(move || -> Result<String, std::io::Error> {
        let file = std::fs::File::open(&path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192]; // 8KB buffer

        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    })
    .await??;

    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file_with(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file
            .write_all(content)
            .expect("Failed to write to temp file");
        temp_file
    }

    #[tokio::test]
    async fn test_file_sha256_known_digest() {
        let temp_file = temp_file_with(b"hello");
        let digest = file_sha256(temp_file.path())
            .await
            .expect("Failed to hash file");
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn test_cleanup_removes_temp_file() {
        let session = UploadSession::new(
            temp_file_with(b"%PDF-1.4"),
            "notes.pdf".to_owned(),
            Some("application/pdf".to_owned()),
            "course-1".to_owned(),
            None,
        );
        let path = session.path().to_path_buf();
        assert!(path.exists());

        session.cleanup().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_mime_guessed_from_file_name_when_not_declared() {
        let session = UploadSession::new(
            temp_file_with(b"%PDF-1.4"),
            "notes.pdf".to_owned(),
            None,
            "course-1".to_owned(),
            None,
        );
        assert_eq!(session.declared_mime, "application/pdf");
    }

    #[test]
    fn test_document_title_falls_back_to_file_name() {
        let session = UploadSession::new(
            temp_file_with(b"%PDF-1.4"),
            "notes.pdf".to_owned(),
            None,
            "course-1".to_owned(),
            Some("  ".to_owned()),
        );
        assert_eq!(session.document_title(), "notes.pdf");

        let titled = UploadSession::new(
            temp_file_with(b"%PDF-1.4"),
            "notes.pdf".to_owned(),
            None,
            "course-1".to_owned(),
            Some("Week 3 slides".to_owned()),
        );
        assert_eq!(titled.document_title(), "Week 3 slides");
    }
}
