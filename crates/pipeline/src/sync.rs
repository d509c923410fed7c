//! Moving event files from a remote source into a job's cache.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::PipelineError;
use crate::EVENT_FILE_EXTENSION;

/// rsync exit status treated as "nothing to transfer".
pub const NOTHING_TO_TRANSFER_EXIT_CODE: i32 = 20;

/// What a sync printed on success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutput {
    pub stdout: String,
}

/// Transfers pending event files from `source` into `destination`,
/// removing each one from the source once it has been copied.
#[async_trait]
pub trait Syncer: Send + Sync {
    async fn sync(&self, source: &str, destination: &Path) -> Result<SyncOutput, PipelineError>;
}

/// [`Syncer`] backed by the `rsync` binary.
#[derive(Debug, Clone)]
pub struct RsyncSyncer {
    program: String,
}

impl RsyncSyncer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(source: &str, destination: &Path) -> Vec<OsString> {
        let mut dest = destination.as_os_str().to_os_string();
        dest.push("/");
        vec![
            "--compress".into(),
            "--recursive".into(),
            format!("--include=*{EVENT_FILE_EXTENSION}").into(),
            "--exclude=*".into(),
            "--remove-source-files".into(),
            source.into(),
            dest,
        ]
    }
}

impl Default for RsyncSyncer {
    fn default() -> Self {
        Self::new("rsync")
    }
}

#[async_trait]
impl Syncer for RsyncSyncer {
    async fn sync(&self, source: &str, destination: &Path) -> Result<SyncOutput, PipelineError> {
        let args = Self::args(source, destination);
        debug!(program = %self.program, ?args, "running rsync");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        match output.status.code() {
            Some(0) => Ok(SyncOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }),
            Some(NOTHING_TO_TRANSFER_EXIT_CODE) => Ok(SyncOutput::default()),
            status => Err(PipelineError::Sync {
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}
