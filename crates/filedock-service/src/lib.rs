//! Business logic services for Filedock.
//!
//! Services are the producer side of the job pipeline: a state-changing
//! request (registration, upload) is persisted and, when it warrants
//! post-processing, a job is enqueued through the [`broker::JobBroker`]
//! seam. The request returns as soon as the broker accepts the job.

pub mod broker;
pub mod file;
pub mod password;
pub mod user;

pub use file::FileService;
pub use user::UserService;
