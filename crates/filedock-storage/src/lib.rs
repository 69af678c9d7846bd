//! File storage backends and derivative generation for Filedock.

pub mod providers;
pub mod thumbnail;

pub use providers::local::LocalStorageProvider;
pub use thumbnail::ThumbnailGenerator;
