//! Producer-side broker seam.

use async_trait::async_trait;
use uuid::Uuid;

use filedock_core::result::AppResult;
use filedock_entity::job::QueueName;

/// Trait for submitting jobs to the queue — decouples producers from the
/// worker crate's queue implementation.
///
/// `enqueue` returns once the broker has durably accepted the job; it never
/// waits for handler execution. The returned ID is a handle for operators,
/// not something producers act on.
#[async_trait]
pub trait JobBroker: Send + Sync + std::fmt::Debug {
    /// Submit a job to the given queue.
    async fn enqueue(&self, queue: QueueName, payload: serde_json::Value) -> AppResult<Uuid>;
}
