//! Stop signals and the two-phase shutdown sequence.
//!
//! Workers poll a [`StopSignal`] between bounded waits; nothing in flight is
//! aborted. [`drain_in_order`] stops the import side first and only then the
//! submission side, so tasks produced by a finishing import still get a
//! worker.

use std::io;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Raising half of a stop flag.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Observing half of a stop flag, cloned into every worker.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Create a lowered stop flag.
pub fn stop_flag() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn raise(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }
}

impl StopSignal {
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the flag is raised (or its handle is gone).
    pub async fn raised(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Raise `import_stop` and wait for every import-side task, then raise
/// `submit_stop` and wait for every submission worker.
pub async fn drain_in_order(
    import_stop: &StopHandle,
    import_tasks: Vec<JoinHandle<()>>,
    submit_stop: &StopHandle,
    submit_tasks: Vec<JoinHandle<()>>,
) {
    info!("stopping import queue");
    import_stop.raise();
    join_all("import", import_tasks).await;

    info!("import queue stopped, stopping event queue");
    submit_stop.raise();
    join_all("submit", submit_tasks).await;
    info!("event queue stopped");
}

async fn join_all(pool: &str, tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            warn!(pool, error = %e, "worker task ended abnormally");
        }
    }
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
///
/// Returns the name of the signal received.
pub async fn wait_for_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => Ok("SIGINT"),
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl_c")
    }
}
