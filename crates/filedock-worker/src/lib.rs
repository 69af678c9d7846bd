//! Background job processing for Filedock.
//!
//! This crate provides:
//! - A job queue over the database for enqueuing and claiming work
//! - A job executor that dispatches delivered jobs to the correct handler
//! - A worker runner that polls both queues and executes jobs concurrently
//! - The thumbnail and welcome-email job handlers

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;

pub use executor::{HandlerError, JobExecutor, JobHandler};
pub use queue::JobQueue;
pub use runner::WorkerRunner;
