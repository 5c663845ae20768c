//! Task status store and idempotency guard.
//!
//! This crate provides:
//! - The `StatusStore` collaborator seam keyed by `(parent_id, task_id)`
//! - A DynamoDB implementation
//! - The read-before-write idempotency guard

pub mod error;
pub mod guard;
pub mod store;

pub use error::{StatusError, StatusResult};
pub use guard::StatusGuard;
pub use store::{DynamoStatusStore, StatusStore};
