use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsn::Dsn;
use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_opt(key).and_then(|v| v.parse().ok())
}

// ── Import ────────────────────────────────────────────────────

/// One configured import: an rsync source paired with a Sentry DSN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Name used in logs.
    pub name: String,
    /// rsync-compatible source path (`user@host:/path`).
    pub source: String,
    /// DSN events from this source are submitted to.
    pub target: Dsn,
}

/// Append the trailing slash rsync needs to copy directory contents.
pub fn normalize_source(source: &str) -> String {
    if source.ends_with('/') {
        source.to_string()
    } else {
        format!("{source}/")
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Importer configuration, loaded once at startup.
///
/// Keys use the camelCase names of the JSON config format
/// (`minTimeBetweenImports`, `numImportWorkers`, ...); snake_case aliases
/// are accepted so TOML files read naturally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub imports: Vec<ImportConfig>,

    /// Root directory holding one cache directory per import.
    pub cache: PathBuf,

    /// Seconds between two dispatches of every import.
    #[serde(
        rename = "minTimeBetweenImports",
        alias = "min_time_between_imports",
        default = "default_min_time_between_imports"
    )]
    pub min_time_between_imports: u64,

    /// Maximum number of imports running at the same time.
    #[serde(
        rename = "numImportWorkers",
        alias = "num_import_workers",
        default = "default_num_import_workers"
    )]
    pub num_import_workers: usize,

    /// Maximum number of submissions running at the same time.
    #[serde(
        rename = "numSubmitWorkers",
        alias = "num_submit_workers",
        default = "default_num_submit_workers"
    )]
    pub num_submit_workers: usize,

    /// HTTP timeout for a single submission, in seconds.
    #[serde(
        rename = "submitTimeoutSecs",
        alias = "submit_timeout_secs",
        default = "default_submit_timeout_secs"
    )]
    pub submit_timeout_secs: u64,

    /// rsync binary to invoke.
    #[serde(rename = "rsyncPath", alias = "rsync_path", default = "default_rsync_path")]
    pub rsync_path: String,
}

fn default_min_time_between_imports() -> u64 {
    60
}

fn default_num_import_workers() -> usize {
    1
}

fn default_num_submit_workers() -> usize {
    4
}

fn default_submit_timeout_secs() -> u64 {
    4
}

fn default_rsync_path() -> String {
    "rsync".into()
}

// ── Loading & Validation ──────────────────────────────────────

impl Config {
    /// Parse config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, CoreError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `SENTRY_IMPORT_CACHE` → `cache`
    /// - `SENTRY_IMPORT_MIN_TIME_BETWEEN_IMPORTS` → `minTimeBetweenImports`
    /// - `SENTRY_IMPORT_NUM_IMPORT_WORKERS` → `numImportWorkers`
    /// - `SENTRY_IMPORT_NUM_SUBMIT_WORKERS` → `numSubmitWorkers`
    /// - `SENTRY_IMPORT_SUBMIT_TIMEOUT_SECS` → `submitTimeoutSecs`
    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_opt("SENTRY_IMPORT_CACHE") {
            self.cache = PathBuf::from(v);
        }
        if let Some(v) = env_parse("SENTRY_IMPORT_MIN_TIME_BETWEEN_IMPORTS") {
            self.min_time_between_imports = v;
        }
        if let Some(v) = env_parse("SENTRY_IMPORT_NUM_IMPORT_WORKERS") {
            self.num_import_workers = v;
        }
        if let Some(v) = env_parse("SENTRY_IMPORT_NUM_SUBMIT_WORKERS") {
            self.num_submit_workers = v;
        }
        if let Some(v) = env_parse("SENTRY_IMPORT_SUBMIT_TIMEOUT_SECS") {
            self.submit_timeout_secs = v;
        }
    }

    /// Check the config before any worker starts.
    pub fn validate(&self) -> Result<(), CoreError> {
        let meta = std::fs::metadata(&self.cache).map_err(|e| {
            CoreError::Config(format!("cache '{}': {e}", self.cache.display()))
        })?;
        if !meta.is_dir() {
            return Err(CoreError::Config(format!(
                "cache '{}' must be a directory",
                self.cache.display()
            )));
        }

        if self.imports.is_empty() {
            return Err(CoreError::Config("no imports configured".into()));
        }
        if self.min_time_between_imports == 0 {
            return Err(CoreError::Config(
                "minTimeBetweenImports must be at least 1".into(),
            ));
        }
        if self.num_import_workers == 0 || self.num_submit_workers == 0 {
            return Err(CoreError::Config(
                "numImportWorkers and numSubmitWorkers must be at least 1".into(),
            ));
        }
        if self.submit_timeout_secs == 0 {
            return Err(CoreError::Config("submitTimeoutSecs must be at least 1".into()));
        }

        let mut names = HashSet::new();
        for import in &self.imports {
            if import.name.trim().is_empty() {
                return Err(CoreError::Config("import with empty name".into()));
            }
            if import.source.trim().is_empty() {
                return Err(CoreError::Config(format!(
                    "import '{}' has an empty source",
                    import.name
                )));
            }
            if !names.insert(import.name.as_str()) {
                return Err(CoreError::Config(format!(
                    "duplicate import name '{}'",
                    import.name
                )));
            }
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            cache = %self.cache.display(),
            interval_secs = self.min_time_between_imports,
            import_workers = self.num_import_workers,
            submit_workers = self.num_submit_workers,
            submit_timeout_secs = self.submit_timeout_secs,
            "config loaded"
        );
        for import in &self.imports {
            tracing::info!(
                import = %import.name,
                source = %import.source,
                target = %import.target,
                "  import"
            );
        }
    }
}
