//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobStatus, QueueName};

/// One unit of asynchronous work.
///
/// A job is created by a producer at request time, claimed by a single
/// worker slot for the duration of processing, and ends in exactly one of
/// the terminal states. Completion carries no return payload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// The logical queue this job belongs to.
    pub queue: QueueName,
    /// Job-specific payload (JSON). Referenced identifiers are opaque
    /// strings; handlers check only that they are present and non-empty.
    pub payload: serde_json::Value,
    /// Current job status.
    pub status: JobStatus,
    /// Number of delivery attempts so far.
    pub attempts: i32,
    /// Maximum allowed delivery attempts.
    pub max_attempts: i32,
    /// Error message from the most recent failed attempt.
    pub error_message: Option<String>,
    /// Earliest execution time (None = immediately eligible).
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the current/last attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Worker that claimed the job.
    pub worker_id: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Check if the job has delivery attempts remaining.
    pub fn has_attempts_remaining(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Target queue.
    pub queue: QueueName,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Maximum delivery attempts.
    pub max_attempts: i32,
}
