//! Thumbnail generation job handler.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use tracing;
use uuid::Uuid;

use filedock_core::result::AppResult;
use filedock_database::repositories::file::FileRepository;
use filedock_entity::file::File;
use filedock_entity::job::{Job, QueueName};
use filedock_storage::ThumbnailGenerator;

use crate::executor::{HandlerError, JobHandler};
use crate::jobs::require_field;

/// Trait for loading file records — decouples the handler from the
/// database crate so it can run against fakes.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug {
    /// Load a file record by identifier, requiring ownership by `user_id`.
    async fn find_owned(&self, file_id: &str, user_id: &str) -> AppResult<Option<File>>;
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find_owned(&self, file_id: &str, user_id: &str) -> AppResult<Option<File>> {
        // Payload identifiers are opaque; one that does not parse cannot
        // match any stored record.
        let Ok(file_id) = Uuid::parse_str(file_id) else {
            return Ok(None);
        };
        let Ok(user_id) = Uuid::parse_str(user_id) else {
            return Ok(None);
        };
        self.find_by_id_and_owner(file_id, user_id).await
    }
}

/// Trait for producing a single resized derivative — decouples the handler
/// from the storage crate.
#[async_trait]
pub trait Thumbnailer: Send + Sync + std::fmt::Debug {
    /// Generate a derivative of the given width next to the source file,
    /// returning the path written.
    async fn generate(&self, source_path: &str, width: u32) -> AppResult<String>;
}

#[async_trait]
impl Thumbnailer for ThumbnailGenerator {
    async fn generate(&self, source_path: &str, width: u32) -> AppResult<String> {
        ThumbnailGenerator::generate(self, source_path, width).await
    }
}

/// Handles thumbnail generation jobs.
#[derive(Debug)]
pub struct ThumbnailJobHandler {
    /// File record store.
    files: Arc<dyn FileStore>,
    /// Derivative generator.
    thumbnailer: Arc<dyn Thumbnailer>,
    /// Widths to generate, in pixels.
    widths: Vec<u32>,
}

impl ThumbnailJobHandler {
    /// Create a new thumbnail job handler.
    pub fn new(
        files: Arc<dyn FileStore>,
        thumbnailer: Arc<dyn Thumbnailer>,
        widths: Vec<u32>,
    ) -> Self {
        Self {
            files,
            thumbnailer,
            widths,
        }
    }
}

#[async_trait]
impl JobHandler for ThumbnailJobHandler {
    fn queue(&self) -> QueueName {
        QueueName::Thumbnail
    }

    async fn execute(&self, job: &Job) -> Result<(), HandlerError> {
        let file_id = require_field(&job.payload, "file_id")?;
        let user_id = require_field(&job.payload, "user_id")?;

        let file = self
            .files
            .find_owned(file_id, user_id)
            .await?
            .ok_or(HandlerError::NotFound("file"))?;

        // Fan out one generation per width. Each width writes to its own
        // target, so the tasks share no mutable state; all are awaited even
        // if one fails, and derivatives already written stay in place.
        let generations = self
            .widths
            .iter()
            .map(|&width| self.thumbnailer.generate(&file.local_path, width));
        let results = future::join_all(generations).await;

        let mut first_failure = None;
        for (&width, result) in self.widths.iter().zip(results) {
            if let Err(err) = result {
                tracing::warn!(
                    file_id = %file.id,
                    width,
                    error = %err,
                    "Thumbnail generation failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }

        if let Some(err) = first_failure {
            return Err(HandlerError::Processing(err));
        }

        tracing::info!(
            file_id = %file.id,
            source = %file.local_path,
            widths = ?self.widths,
            "Generated thumbnail set"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use chrono::Utc;
    use filedock_core::error::AppError;
    use filedock_entity::job::JobStatus;
    use serde_json::json;

    #[derive(Debug)]
    struct StaticFileStore {
        file: Option<File>,
    }

    #[async_trait]
    impl FileStore for StaticFileStore {
        async fn find_owned(&self, _file_id: &str, _user_id: &str) -> AppResult<Option<File>> {
            Ok(self.file.clone())
        }
    }

    /// Writes marker files into a temp directory, optionally failing for
    /// one poisoned width.
    #[derive(Debug)]
    struct TempThumbnailer {
        root: PathBuf,
        fail_width: Option<u32>,
        calls: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl Thumbnailer for TempThumbnailer {
        async fn generate(&self, source_path: &str, width: u32) -> AppResult<String> {
            self.calls.lock().unwrap().push(width);
            if self.fail_width == Some(width) {
                return Err(AppError::storage("simulated write failure"));
            }
            let target = self.root.join(format!("{source_path}_{width}"));
            std::fs::write(&target, b"thumb").map_err(AppError::from)?;
            Ok(target.display().to_string())
        }
    }

    fn make_file() -> File {
        File {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "photo.png".to_string(),
            local_path: "photo.png".to_string(),
            mime_type: Some("image/png".to_string()),
            size_bytes: 1024,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_job(payload: serde_json::Value) -> Job {
        Job {
            id: Uuid::new_v4(),
            queue: QueueName::Thumbnail,
            payload,
            status: JobStatus::Running,
            attempts: 1,
            max_attempts: 3,
            error_message: None,
            scheduled_at: None,
            started_at: Some(Utc::now()),
            completed_at: None,
            worker_id: Some("test-worker".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_handler(
        file: Option<File>,
        fail_width: Option<u32>,
    ) -> (tempfile::TempDir, Arc<TempThumbnailer>, ThumbnailJobHandler) {
        let dir = tempfile::tempdir().expect("tempdir");
        let thumbnailer = Arc::new(TempThumbnailer {
            root: dir.path().to_path_buf(),
            fail_width,
            calls: Mutex::new(Vec::new()),
        });
        let handler = ThumbnailJobHandler::new(
            Arc::new(StaticFileStore { file }),
            Arc::clone(&thumbnailer) as Arc<dyn Thumbnailer>,
            vec![500, 250, 100],
        );
        (dir, thumbnailer, handler)
    }

    #[tokio::test]
    async fn test_missing_file_id_fails_before_any_write() {
        let (dir, thumbnailer, handler) = make_handler(Some(make_file()), None);

        let err = handler
            .execute(&make_job(json!({ "user_id": "u1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::MissingField("file_id")));
        assert!(thumbnailer.calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_user_id_fails_before_any_write() {
        let (dir, thumbnailer, handler) = make_handler(Some(make_file()), None);

        let err = handler
            .execute(&make_job(json!({ "file_id": "f1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::MissingField("user_id")));
        assert!(thumbnailer.calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_file_is_not_found() {
        let (_dir, thumbnailer, handler) = make_handler(None, None);

        let err = handler
            .execute(&make_job(json!({ "file_id": "f1", "user_id": "u1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::NotFound("file")));
        assert!(thumbnailer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_writes_all_three_derivatives() {
        let (dir, _thumbnailer, handler) = make_handler(Some(make_file()), None);

        handler
            .execute(&make_job(json!({ "file_id": "f1", "user_id": "u1" })))
            .await
            .unwrap();

        for width in [500, 250, 100] {
            assert!(
                dir.path().join(format!("photo.png_{width}")).exists(),
                "missing derivative for width {width}"
            );
        }
    }

    #[tokio::test]
    async fn test_single_width_failure_fails_job_but_keeps_other_derivatives() {
        let (dir, thumbnailer, handler) = make_handler(Some(make_file()), Some(250));

        let err = handler
            .execute(&make_job(json!({ "file_id": "f1", "user_id": "u1" })))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Processing(_)));
        // All three widths were attempted; no short-circuit on failure.
        assert_eq!(thumbnailer.calls.lock().unwrap().len(), 3);
        assert!(dir.path().join("photo.png_500").exists());
        assert!(dir.path().join("photo.png_100").exists());
        assert!(!dir.path().join("photo.png_250").exists());
    }
}
