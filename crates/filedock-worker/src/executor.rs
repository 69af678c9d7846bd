//! Job executor — dispatches delivered jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing;

use filedock_core::error::AppError;
use filedock_entity::job::{Job, QueueName};

/// Error from job handler execution.
///
/// The executor and runner treat every handler identically through this
/// taxonomy; retry policy hangs off [`HandlerError::is_retryable`] alone.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// A required payload field is absent or empty. Producer bug; retrying
    /// the same payload can never succeed.
    #[error("Missing payload field: {0}")]
    MissingField(&'static str),

    /// The referenced entity does not exist (or is not owned by the payload
    /// user). May be a creation/enqueue race, so worth retrying.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Execution failed after validation — transport, IO, or codec error.
    #[error("Job processing failed: {0}")]
    Processing(#[from] AppError),
}

impl HandlerError {
    /// Whether the broker should redeliver the job after this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MissingField(_))
    }
}

/// Trait for job handler implementations.
///
/// One handler is registered per queue. A delivered job is owned by exactly
/// one `execute` invocation; the runner acknowledges the outcome exactly
/// once based on the returned result.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The queue this handler consumes.
    fn queue(&self) -> QueueName;

    /// Execute the job. Completion carries no payload.
    async fn execute(&self, job: &Job) -> Result<(), HandlerError>;
}

/// Dispatches jobs to the appropriate handler based on queue name.
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by queue.
    handlers: HashMap<QueueName, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a job handler for its queue.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let queue = handler.queue();
        tracing::info!(queue = %queue, "Registered job handler");
        self.handlers.insert(queue, handler);
    }

    /// Execute a job by dispatching to the handler for its queue.
    pub async fn execute(&self, job: &Job) -> Result<(), HandlerError> {
        let handler = self.handlers.get(&job.queue).ok_or_else(|| {
            HandlerError::Processing(AppError::internal(format!(
                "No handler registered for queue '{}'",
                job.queue
            )))
        })?;

        handler.execute(job).await
    }

    /// Check if a handler is registered for a queue.
    pub fn has_handler(&self, queue: QueueName) -> bool {
        self.handlers.contains_key(&queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use filedock_entity::job::JobStatus;
    use uuid::Uuid;

    #[derive(Debug)]
    struct NoopHandler(QueueName);

    #[async_trait]
    impl JobHandler for NoopHandler {
        fn queue(&self) -> QueueName {
            self.0
        }

        async fn execute(&self, _job: &Job) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn make_job(queue: QueueName) -> Job {
        Job {
            id: Uuid::new_v4(),
            queue,
            payload: serde_json::json!({}),
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

    #[tokio::test]
    async fn test_dispatches_to_registered_handler() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(NoopHandler(QueueName::Email)));

        assert!(executor.has_handler(QueueName::Email));
        assert!(executor.execute(&make_job(QueueName::Email)).await.is_ok());
    }

    #[tokio::test]
    async fn test_unregistered_queue_is_an_error() {
        let executor = JobExecutor::new();
        let err = executor
            .execute(&make_job(QueueName::Thumbnail))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Processing(_)));
    }

    #[test]
    fn test_retryability() {
        assert!(!HandlerError::MissingField("file_id").is_retryable());
        assert!(HandlerError::NotFound("file").is_retryable());
        assert!(HandlerError::Processing(AppError::storage("disk full")).is_retryable());
    }
}
