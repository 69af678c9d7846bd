//! Job queue — the embedded broker's enqueue/claim/acknowledge surface.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing;
use uuid::Uuid;

use filedock_core::config::worker::WorkerConfig;
use filedock_core::result::AppResult;
use filedock_database::repositories::job::JobRepository;
use filedock_entity::job::{CreateJob, Job, QueueName};
use filedock_service::broker::JobBroker;

/// Job queue for enqueuing and claiming work.
///
/// Producers see this through the [`JobBroker`] trait; the worker runner
/// uses the claim/acknowledge methods directly. Delivery is at-least-once:
/// a claim that is never acknowledged leaves the job `running` and visible
/// to operators rather than silently lost.
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Job repository for database persistence.
    repo: Arc<JobRepository>,
    /// Worker identifier recorded on claimed jobs.
    worker_id: String,
    /// Delivery attempts allotted to newly enqueued jobs.
    default_max_attempts: i32,
    /// Base retry delay; grows linearly with the attempt count.
    retry_backoff_seconds: u64,
}

impl JobQueue {
    /// Create a new job queue.
    pub fn new(repo: Arc<JobRepository>, worker_id: String, config: &WorkerConfig) -> Self {
        Self {
            repo,
            worker_id,
            default_max_attempts: config.max_attempts,
            retry_backoff_seconds: config.retry_backoff_seconds,
        }
    }

    /// Enqueue a new job.
    pub async fn enqueue(&self, queue: QueueName, payload: serde_json::Value) -> AppResult<Job> {
        let job = self
            .repo
            .create(&CreateJob {
                queue,
                payload,
                max_attempts: self.default_max_attempts,
            })
            .await?;

        tracing::debug!(job_id = %job.id, queue = %job.queue, "Enqueued job");
        Ok(job)
    }

    /// Claim the next eligible job from the given queue.
    pub async fn dequeue(&self, queue: QueueName) -> AppResult<Option<Job>> {
        let job = self.repo.claim_next(queue, &self.worker_id).await?;

        if let Some(job) = &job {
            tracing::debug!(
                job_id = %job.id,
                queue = %job.queue,
                attempt = job.attempts,
                "Claimed job"
            );
        }

        Ok(job)
    }

    /// Acknowledge a claimed job as completed.
    pub async fn complete(&self, job_id: Uuid) -> AppResult<()> {
        self.repo.mark_completed(job_id).await?;
        tracing::debug!(%job_id, "Job completed");
        Ok(())
    }

    /// Acknowledge a claimed job as failed, with no further attempts.
    pub async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.repo.mark_failed(job_id, error).await?;
        tracing::debug!(%job_id, error, "Job failed");
        Ok(())
    }

    /// Return a claimed job to the queue for a later attempt.
    ///
    /// The delay grows linearly with the attempt count.
    pub async fn retry_later(&self, job: &Job, error: &str) -> AppResult<()> {
        let delay =
            Duration::seconds((self.retry_backoff_seconds * job.attempts.max(1) as u64) as i64);
        self.repo.reschedule(job.id, error, delay).await?;
        tracing::debug!(
            job_id = %job.id,
            delay_seconds = delay.num_seconds(),
            "Job rescheduled for retry"
        );
        Ok(())
    }
}

#[async_trait]
impl JobBroker for JobQueue {
    async fn enqueue(&self, queue: QueueName, payload: serde_json::Value) -> AppResult<Uuid> {
        let job = JobQueue::enqueue(self, queue, payload).await?;
        Ok(job.id)
    }
}
