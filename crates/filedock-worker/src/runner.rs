//! Worker runner — main loop that polls the queues and executes jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::time;
use tracing;

use filedock_core::config::worker::WorkerConfig;
use filedock_entity::job::QueueName;

use crate::executor::JobExecutor;
use crate::queue::JobQueue;

/// Main worker runner that polls the queues and executes jobs.
///
/// Each poll tick offers a claim to every queue in turn, so the thumbnail
/// and email queues make progress independently of each other. A semaphore
/// bounds concurrent job slots; each slot runs one job to completion.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue for claiming and acknowledging.
    queue: Arc<JobQueue>,
    /// Job executor for dispatching.
    executor: Arc<JobExecutor>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier.
    worker_id: String,
    /// Queues to poll.
    queues: Vec<QueueName>,
}

impl WorkerRunner {
    /// Create a new worker runner polling both queues.
    pub fn new(
        queue: Arc<JobQueue>,
        executor: Arc<JobExecutor>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            queue,
            executor,
            config,
            worker_id,
            queues: vec![QueueName::Thumbnail, QueueName::Email],
        }
    }

    /// Start the worker runner — runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval = self.config.poll_interval_seconds,
            queues = ?self.queues,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(worker_id = %self.worker_id, "Received shutdown signal");
                        break;
                    }
                }
                _ = self.poll_once(&semaphore) => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!(worker_id = %self.worker_id, "Shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!(
            worker_id = %self.worker_id,
            "Waiting for in-flight jobs to complete..."
        );

        let max_permits = self.config.concurrency as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;

        tracing::info!(worker_id = %self.worker_id, "Worker shut down");
    }

    /// Offer one claim to each queue, spawning a task per claimed job.
    async fn poll_once(&self, semaphore: &Arc<Semaphore>) {
        for &queue_name in &self.queues {
            let permit = match Arc::clone(semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::trace!("All worker slots occupied");
                    return;
                }
            };

            match self.queue.dequeue(queue_name).await {
                Ok(Some(job)) => {
                    let queue = Arc::clone(&self.queue);
                    let executor = Arc::clone(&self.executor);

                    tokio::spawn(async move {
                        let _permit = permit;
                        let job_id = job.id;

                        tracing::info!(
                            %job_id,
                            queue = %job.queue,
                            attempt = job.attempts,
                            max_attempts = job.max_attempts,
                            "Processing job"
                        );

                        // Exactly one acknowledgment per delivered job: every
                        // outcome takes a single terminal path below.
                        let ack = match executor.execute(&job).await {
                            Ok(()) => {
                                tracing::info!(%job_id, "Job completed");
                                queue.complete(job_id).await
                            }
                            Err(err) if err.is_retryable() && job.has_attempts_remaining() => {
                                tracing::warn!(%job_id, error = %err, "Job failed, will retry");
                                queue.retry_later(&job, &err.to_string()).await
                            }
                            Err(err) => {
                                tracing::error!(%job_id, error = %err, "Job failed permanently");
                                queue.fail(job_id, &err.to_string()).await
                            }
                        };

                        if let Err(e) = ack {
                            tracing::error!(%job_id, error = %e, "Failed to acknowledge job");
                        }
                    });
                }
                Ok(None) => {
                    drop(permit);
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(queue = %queue_name, error = %e, "Failed to claim job");
                }
            }
        }
    }
}
