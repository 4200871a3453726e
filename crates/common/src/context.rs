//! Per-run state threaded through the pipeline.
//!
//! A [`RunContext`] owns the scratch directory for intermediate segment
//! files and the cooperative cancellation flag. The scratch directory is
//! removed when the context is dropped, on success and failure alike.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{VoxreelError, VoxreelResult};

/// Cloneable handle used to request cancellation of a run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested. Polls every 100ms,
    /// for use as a `tokio::select!` branch next to a child process.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// State owned by a single composition run.
#[derive(Debug)]
pub struct RunContext {
    run_id: String,
    started: Instant,
    started_wall: String,
    scratch: tempfile::TempDir,
    cancel: CancelFlag,
}

impl RunContext {
    /// Create a context with a fresh scratch directory under the system temp dir.
    pub fn new() -> VoxreelResult<Self> {
        let scratch = tempfile::Builder::new().prefix("voxreel-run-").tempdir()?;
        Ok(Self::from_scratch(scratch))
    }

    /// Create a context whose scratch directory lives under `parent`.
    pub fn new_in(parent: impl AsRef<Path>) -> VoxreelResult<Self> {
        std::fs::create_dir_all(parent.as_ref())?;
        let scratch = tempfile::Builder::new()
            .prefix("voxreel-run-")
            .tempdir_in(parent)?;
        Ok(Self::from_scratch(scratch))
    }

    fn from_scratch(scratch: tempfile::TempDir) -> Self {
        let now = chrono::Utc::now();
        let run_id = format!("run-{}", now.format("%Y%m%dT%H%M%S%.3f"));
        tracing::debug!(run_id = %run_id, scratch = %scratch.path().display(), "Run context created");
        Self {
            run_id,
            started: Instant::now(),
            started_wall: now.to_rfc3339(),
            scratch,
            cancel: CancelFlag::new(),
        }
    }

    /// Attach an externally owned cancel flag (e.g. one wired to Ctrl-C).
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Wall-clock time at run start (RFC 3339).
    pub fn started_wall(&self) -> &str {
        &self.started_wall
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Path for an intermediate file inside the scratch directory.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Return `Err(Cancelled)` once cancellation has been requested.
    pub fn check_cancelled(&self) -> VoxreelResult<()> {
        if self.is_cancelled() {
            Err(VoxreelError::Cancelled)
        } else {
            Ok(())
        }
    }
}
