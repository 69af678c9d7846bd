//! PostgreSQL persistence for Filedock.
//!
//! Connection pool management, migrations, and the repository layer.
//! Repositories are plain structs over a [`sqlx::PgPool`]; they are
//! constructed explicitly and passed in wherever records are needed,
//! never reached through process-wide state.

pub mod connection;
pub mod migration;
pub mod repositories;
