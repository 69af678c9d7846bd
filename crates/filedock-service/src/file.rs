//! File upload — the producer for the thumbnail queue.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use filedock_core::error::AppError;
use filedock_core::result::AppResult;
use filedock_core::traits::storage::StorageProvider;
use filedock_database::repositories::file::FileRepository;
use filedock_entity::file::{CreateFile, File};
use filedock_entity::job::QueueName;

use crate::broker::JobBroker;

/// Handles file uploads and their follow-up processing jobs.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Storage provider for file bytes.
    storage: Arc<dyn StorageProvider>,
    /// Job broker for the thumbnail queue.
    broker: Arc<dyn JobBroker>,
}

/// Data for a single-request upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// The uploading user.
    pub owner_id: Uuid,
    /// File name (including extension).
    pub name: String,
    /// MIME type, if the client supplied one.
    pub mime_type: Option<String>,
    /// The file bytes.
    pub data: Bytes,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        storage: Arc<dyn StorageProvider>,
        broker: Arc<dyn JobBroker>,
    ) -> Self {
        Self {
            file_repo,
            storage,
            broker,
        }
    }

    /// Stores an uploaded file and enqueues thumbnail generation for images.
    pub async fn upload(&self, req: UploadRequest) -> AppResult<File> {
        if req.name.trim().is_empty() {
            return Err(AppError::validation("File name is required"));
        }

        let local_path = format!("{}/{}", req.owner_id, Uuid::new_v4());
        let size_bytes = req.data.len() as i64;

        self.storage.write(&local_path, req.data).await?;

        let file = self
            .file_repo
            .create(&CreateFile {
                owner_id: req.owner_id,
                name: req.name,
                local_path,
                mime_type: req.mime_type,
                size_bytes,
            })
            .await?;

        if file.is_image() {
            let job_id = self
                .broker
                .enqueue(
                    QueueName::Thumbnail,
                    json!({
                        "file_id": file.id.to_string(),
                        "user_id": file.owner_id.to_string(),
                    }),
                )
                .await?;
            info!(file_id = %file.id, %job_id, "Upload stored, thumbnail job enqueued");
        } else {
            info!(file_id = %file.id, "Upload stored");
        }

        Ok(file)
    }
}
