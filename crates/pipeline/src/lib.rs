//! Scheduled rsync-to-Sentry import pipeline.
//!
//! This crate provides:
//! - `Job` with its per-job exclusion lock and derived cache directory
//! - `Syncer` trait and the rsync-backed implementation
//! - the import scheduler and the import/submission worker pools
//! - `Pipeline`, which owns the queues and stop signals and drains them in order

pub mod cache;
pub mod error;
pub mod import;
pub mod job;
pub mod pipeline;
pub mod queue;
pub mod scheduler;
pub mod shutdown;
pub mod submit;
pub mod sync;

pub use error::PipelineError;
pub use job::Job;
pub use pipeline::{Pipeline, PipelineSettings};
pub use submit::{SubmitOutcome, SubmitTask, Submitter};
pub use sync::{RsyncSyncer, SyncOutput, Syncer};

/// Suffix marking a cached file as an event not yet delivered.
pub const EVENT_FILE_EXTENSION: &str = ".sentry_report";
