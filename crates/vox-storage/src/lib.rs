//! S3 artifact storage.
//!
//! This crate provides:
//! - `s3://bucket/key` URI parsing and validation
//! - The `BlobStore` collaborator seam
//! - An S3 upload client

pub mod client;
pub mod error;
pub mod uri;

pub use client::{BlobStore, S3BlobStore};
pub use error::{StorageError, StorageResult};
pub use uri::S3Uri;
