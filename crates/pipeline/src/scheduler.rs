//! Import scheduler: enqueues every job once per interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::job::Job;
use crate::shutdown::StopSignal;

/// Shortest dispatch interval; smaller values are raised to it.
pub const MIN_DISPATCH_INTERVAL: Duration = Duration::from_millis(1);

/// Dispatch all `jobs`, in order, every `interval`.
///
/// Ticks are measured from the start of the previous dispatch. A dispatch
/// that overruns the interval is followed by an immediate tick, without
/// catch-up bursts. Enqueueing blocks while the import pool is busy.
/// Returns once `stop` is raised or the queue is closed.
pub async fn run_scheduler(
    jobs: Arc<[Arc<Job>]>,
    interval: Duration,
    queue: mpsc::Sender<Arc<Job>>,
    mut stop: StopSignal,
) {
    let mut ticker = tokio::time::interval(interval.max(MIN_DISPATCH_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.raised() => break,
        }

        debug!(jobs = jobs.len(), "dispatching imports");
        for job in jobs.iter() {
            tokio::select! {
                sent = queue.send(job.clone()) => {
                    if sent.is_err() {
                        info!("import queue closed, scheduler exiting");
                        return;
                    }
                }
                _ = stop.raised() => {
                    info!("scheduler stopped mid-dispatch");
                    return;
                }
            }
        }
    }
    info!("scheduler stopped");
}
