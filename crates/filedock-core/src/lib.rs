//! Core building blocks shared by every Filedock crate.
//!
//! This crate carries the unified error type, the configuration schemas,
//! and the storage provider trait. It has no knowledge of the database,
//! the worker, or any concrete backend.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
