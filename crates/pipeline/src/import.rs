//! Import workers: sync a job's source into its cache and queue every
//! cached event file for submission.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cache;
use crate::error::PipelineError;
use crate::job::Job;
use crate::queue::{Received, WorkReceiver};
use crate::shutdown::StopSignal;
use crate::submit::SubmitTask;
use crate::sync::Syncer;
use crate::EVENT_FILE_EXTENSION;

/// Run one import cycle for `job`.
///
/// Holds the job's lock for the whole cycle. Every pending file in the
/// cache is queued, including leftovers from earlier failed submissions.
/// Returns the number of tasks queued.
pub async fn run_import_cycle(
    job: &Job,
    syncer: &dyn Syncer,
    submit_queue: &mpsc::Sender<SubmitTask>,
) -> Result<usize, PipelineError> {
    let _guard = job.lock().await;

    cache::ensure(&job.cache_dir)?;
    info!(job = %job.name, source = %job.source, "rsync");
    let output = syncer.sync(&job.source, &job.cache_dir).await?;
    if !output.stdout.is_empty() {
        debug!(job = %job.name, output = %output.stdout.trim(), "rsync output");
    }

    let files = discover_event_files(&job.cache_dir).await?;
    let queued = files.len();
    for file in files {
        let task = SubmitTask {
            file,
            target: job.target.clone(),
            job_name: job.name.clone(),
        };
        submit_queue
            .send(task)
            .await
            .map_err(|_| PipelineError::QueueClosed)?;
    }
    Ok(queued)
}

/// List the pending event files directly inside `dir`, sorted by path.
pub async fn discover_event_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let is_event = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(EVENT_FILE_EXTENSION));
        if is_event && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Import worker loop. Checks `stop` before every receive and exits as
/// soon as it is raised; a cycle already running is finished first.
pub async fn import_worker(
    id: usize,
    queue: WorkReceiver<Arc<Job>>,
    syncer: Arc<dyn Syncer>,
    submit_queue: mpsc::Sender<SubmitTask>,
    stop: StopSignal,
    poll: Duration,
) {
    while !stop.is_raised() {
        match queue.recv_timeout(poll).await {
            Received::Item(job) => {
                match run_import_cycle(&job, syncer.as_ref(), &submit_queue).await {
                    Ok(queued) => debug!(job = %job.name, queued, "import cycle done"),
                    Err(e) => error!(job = %job.name, error = %e, "import cycle failed"),
                }
            }
            Received::Idle => {}
            Received::Closed => break,
        }
    }
    debug!(worker = id, "import worker stopped");
}
