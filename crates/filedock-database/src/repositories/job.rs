//! Job repository implementation.
//!
//! Queue persistence for the embedded broker: FIFO claim with
//! `FOR UPDATE SKIP LOCKED`, SQL-guarded terminal transitions, and
//! backoff rescheduling.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use filedock_core::error::{AppError, ErrorKind};
use filedock_core::result::AppResult;
use filedock_entity::job::{CreateJob, Job, QueueName};

/// Repository for background job persistence and queue operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new pending job.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (queue, payload, max_attempts) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.queue)
        .bind(&data.payload)
        .bind(data.max_attempts)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    /// Claim the next eligible job from a queue (oldest first).
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent worker slots never claim
    /// the same row. Claiming increments the attempt counter and records the
    /// worker, so every delivery is accounted for even if the worker dies
    /// mid-job.
    pub async fn claim_next(&self, queue: QueueName, worker_id: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = NOW(), worker_id = $2, \
             attempts = attempts + 1, updated_at = NOW() \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE queue = $1 AND status = 'pending' \
                AND (scheduled_at IS NULL OR scheduled_at <= NOW()) \
                ORDER BY created_at ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(queue)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    /// Mark a running job as completed.
    ///
    /// The `status = 'running'` guard makes the terminal transition happen at
    /// most once; a second acknowledgment surfaces as a conflict instead of
    /// rewriting history.
    pub async fn mark_completed(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Job {id} is not running; refusing duplicate acknowledgment"
            )));
        }
        Ok(())
    }

    /// Mark a running job as failed with the given error message.
    pub async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, completed_at = NOW(), \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job failed", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Job {id} is not running; refusing duplicate acknowledgment"
            )));
        }
        Ok(())
    }

    /// Return a running job to the pending state for a later attempt.
    pub async fn reschedule(&self, id: Uuid, error: &str, delay: Duration) -> AppResult<()> {
        let scheduled_at = Utc::now() + delay;
        let result = sqlx::query(
            "UPDATE jobs SET status = 'pending', error_message = $2, scheduled_at = $3, \
             worker_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'running'",
        )
        .bind(id)
        .bind(error)
        .bind(scheduled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reschedule job", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Job {id} is not running; refusing duplicate acknowledgment"
            )));
        }
        Ok(())
    }
}
