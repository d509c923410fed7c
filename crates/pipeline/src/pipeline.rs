//! The pipeline owner: both queues, both stop flags and every worker task.
//!
//! ```text
//! scheduler ──▶ import queue ──▶ import workers ──▶ submit queue ──▶ submit workers ──▶ store API
//! ```
//!
//! Constructed once by [`Pipeline::start`] and torn down once by
//! [`Pipeline::shutdown`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use sentry_import_core::Config;

use crate::error::PipelineError;
use crate::import::import_worker;
use crate::job::Job;
use crate::queue::work_queue;
use crate::scheduler::run_scheduler;
use crate::shutdown::{drain_in_order, stop_flag, StopHandle};
use crate::submit::{submit_worker, SubmitTask, Submitter};
use crate::sync::Syncer;

/// How often idle workers look at their stop flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra time on top of one submission timeout granted to shutdown.
pub const SHUTDOWN_SLACK: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Raised to [`MIN_DISPATCH_INTERVAL`](crate::scheduler::MIN_DISPATCH_INTERVAL) if smaller.
    pub min_time_between_imports: Duration,
    pub import_workers: usize,
    pub submit_workers: usize,
    pub submit_timeout: Duration,
    pub poll_interval: Duration,
    /// Hard limit for [`Pipeline::shutdown`].
    pub shutdown_deadline: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let submit_timeout = Duration::from_secs(config.submit_timeout_secs);
        Self {
            min_time_between_imports: Duration::from_secs(config.min_time_between_imports),
            import_workers: config.num_import_workers,
            submit_workers: config.num_submit_workers,
            submit_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_deadline: submit_timeout + SHUTDOWN_SLACK,
        }
    }
}

/// A running pipeline.
pub struct Pipeline {
    import_stop: StopHandle,
    submit_stop: StopHandle,
    scheduler: JoinHandle<()>,
    import_workers: Vec<JoinHandle<()>>,
    submit_workers: Vec<JoinHandle<()>>,
    shutdown_deadline: Duration,
}

impl Pipeline {
    /// Create both queues and spawn the submission pool, the scheduler and
    /// the import pool. The first dispatch happens immediately.
    pub fn start(
        jobs: Vec<Arc<Job>>,
        settings: PipelineSettings,
        syncer: Arc<dyn Syncer>,
        submitter: Arc<Submitter>,
    ) -> Self {
        let (submit_tx, submit_rx) = work_queue::<SubmitTask>();
        let (submit_stop, submit_signal) = stop_flag();
        let submit_workers = (0..settings.submit_workers)
            .map(|id| {
                tokio::spawn(submit_worker(
                    id,
                    submit_rx.clone(),
                    submitter.clone(),
                    submit_signal.clone(),
                    settings.poll_interval,
                ))
            })
            .collect();

        let (import_tx, import_rx) = work_queue::<Arc<Job>>();
        let (import_stop, import_signal) = stop_flag();
        let scheduler = tokio::spawn(run_scheduler(
            jobs.into(),
            settings.min_time_between_imports,
            import_tx,
            import_signal.clone(),
        ));
        let import_workers = (0..settings.import_workers)
            .map(|id| {
                tokio::spawn(import_worker(
                    id,
                    import_rx.clone(),
                    syncer.clone(),
                    submit_tx.clone(),
                    import_signal.clone(),
                    settings.poll_interval,
                ))
            })
            .collect();

        info!(
            import_workers = settings.import_workers,
            submit_workers = settings.submit_workers,
            interval = ?settings.min_time_between_imports,
            "pipeline started"
        );

        Self {
            import_stop,
            submit_stop,
            scheduler,
            import_workers,
            submit_workers,
            shutdown_deadline: settings.shutdown_deadline,
        }
    }

    /// Stop the scheduler and import workers, wait for them, then stop and
    /// wait for the submission workers.
    ///
    /// Returns [`PipelineError::ShutdownTimeout`] if this takes longer than
    /// the configured deadline; the caller is expected to exit the process.
    pub async fn shutdown(self) -> Result<(), PipelineError> {
        let Self {
            import_stop,
            submit_stop,
            scheduler,
            mut import_workers,
            submit_workers,
            shutdown_deadline,
        } = self;
        import_workers.insert(0, scheduler);

        tokio::time::timeout(
            shutdown_deadline,
            drain_in_order(&import_stop, import_workers, &submit_stop, submit_workers),
        )
        .await
        .map_err(|_| PipelineError::ShutdownTimeout(shutdown_deadline))
    }
}
