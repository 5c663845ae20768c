//! SQS job queue and message normalization.
//!
//! This crate provides:
//! - The `MessageQueue` collaborator seam (receive/delete/send)
//! - An SQS implementation with long-poll semantics
//! - Envelope unwrapping and job-record validation
//! - Dead-letter forwarding

pub mod envelope;
pub mod error;
pub mod sqs;

pub use envelope::{normalize, EnvelopeError};
pub use error::{QueueError, QueueResult};
pub use sqs::{MessageQueue, QueueConfig, QueueMessage, SqsQueue};
