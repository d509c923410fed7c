//! Pipeline error types.

use std::time::Duration;

use thiserror::Error;

use sentry_import_core::CoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rsync exited with status {status:?}: {stderr}")]
    Sync { status: Option<i32>, stderr: String },

    #[error("queue closed")]
    QueueClosed,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error(transparent)]
    Core(#[from] CoreError),
}
