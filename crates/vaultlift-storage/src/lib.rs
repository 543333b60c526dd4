//! Vaultlift Storage Library
//!
//! This crate provides the remote object store abstraction used by the upload
//! and cleanup pipelines, and an implementation for S3-compatible providers.
//!
//! # Key format
//!
//! Keys are bucket-relative and never start with `/`. They are produced by
//! `vaultlift_core::keys` as `[folderPath/][datePath/]fileName`; this crate
//! stores whatever key it is given.

pub mod factory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ListPage, RemoteStore, StorageError, StorageResult};
