//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A file record stored in Filedock.
///
/// Only the metadata lives in the database; the bytes live behind the
/// storage provider at `local_path`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The user who owns this file.
    pub owner_id: Uuid,
    /// The file name (including extension).
    pub name: String,
    /// The path within the storage provider.
    pub local_path: String,
    /// MIME type of the file.
    pub mime_type: Option<String>,
    /// File size in bytes.
    pub size_bytes: i64,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Check whether this file is an image eligible for thumbnailing.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file owner.
    pub owner_id: Uuid,
    /// The file name.
    pub name: String,
    /// The path within the storage provider.
    pub local_path: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// File size in bytes.
    pub size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(mime_type: Option<&str>) -> File {
        File {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "photo.png".to_string(),
            local_path: "u1/photo".to_string(),
            mime_type: mime_type.map(String::from),
            size_bytes: 1024,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_image() {
        assert!(make_file(Some("image/png")).is_image());
        assert!(!make_file(Some("text/plain")).is_image());
        assert!(!make_file(None).is_image());
    }
}
