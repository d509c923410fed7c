//! Shared fixtures: a stub store API and local-directory syncers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;

use sentry_import_pipeline::{PipelineError, PipelineSettings, SyncOutput, Syncer};

// ── Stub store API ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub auth: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

type Responder = Arc<dyn Fn(&str) -> (StatusCode, String) + Send + Sync>;

#[derive(Clone)]
struct StubState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Responder,
}

pub struct StubStore {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubStore {
    /// Start a store API on an ephemeral port. `responder` maps a request
    /// body to the response status and body.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str) -> (StatusCode, String) + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            requests: requests.clone(),
            responder: Arc::new(responder),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, requests }
    }

    /// DSN pointing at this stub for project 42.
    pub fn dsn(&self) -> String {
        format!("http://pub:sec@{}/42", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<StubState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let body = String::from_utf8_lossy(&body).into_owned();
    let response = (state.responder)(&body);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        auth: header("x-sentry-auth"),
        content_type: header("content-type"),
        body,
    });
    response
}

// ── Syncers ─────────────────────────────────────────────────────────

/// Moves `*.sentry_report` files from a local directory standing in for
/// each remote source, counting syncs per source.
#[derive(Default)]
pub struct DirSyncer {
    sources: HashMap<String, PathBuf>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
}

impl DirSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: &str, dir: &Path) -> Self {
        self.sources.insert(source.to_string(), dir.to_path_buf());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, source: &str) -> usize {
        self.calls.lock().unwrap().get(source).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Syncer for DirSyncer {
    async fn sync(&self, source: &str, destination: &Path) -> Result<SyncOutput, PipelineError> {
        *self.calls.lock().unwrap().entry(source.to_string()).or_default() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let Some(dir) = self.sources.get(source) else {
            return Ok(SyncOutput::default());
        };
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_event = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".sentry_report"));
            if is_event {
                let file_name = path.file_name().unwrap_or_default();
                std::fs::copy(&path, destination.join(file_name))?;
                std::fs::remove_file(&path)?;
            }
        }
        Ok(SyncOutput::default())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

pub fn settings(import_workers: usize, submit_workers: usize, interval: Duration) -> PipelineSettings {
    PipelineSettings {
        min_time_between_imports: interval,
        import_workers,
        submit_workers,
        submit_timeout: Duration::from_secs(4),
        poll_interval: Duration::from_millis(100),
        shutdown_deadline: Duration::from_secs(8),
    }
}

pub fn pending_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().to_str().map(String::from))
                .filter(|n| n.ends_with(".sentry_report"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Poll `check` every 20ms until it holds, panicking after `limit`.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, what: &str, check: F) {
    let started = std::time::Instant::now();
    while !check() {
        if started.elapsed() > limit {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
