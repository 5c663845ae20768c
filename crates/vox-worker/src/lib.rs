//! Queue-driven text-to-speech job worker.
//!
//! Polls the job queue, turns each text payload into an audio + subtitle
//! artifact pair, records per-task outcome in the status store, and routes
//! unrecoverable failures to the dead-letter queue.

pub mod config;
pub mod error;
pub mod processor;
pub mod runner;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use processor::{JobProcessor, ProcessOutcome};
pub use runner::WorkerLoop;
