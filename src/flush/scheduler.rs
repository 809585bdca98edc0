//! Flush Scheduler
//!
//! One background task per memory-backed collection.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{Result, ShelfError};
use crate::storage::{read_documents, sidecar, write_documents, FileLock, MemoryBackend};

/// Owned handle on a running flush task
///
/// Dropping the handle without `stop` aborts the task without a final
/// flush.
pub struct FlushScheduler {
    state: Arc<FlushState>,
    interval: Duration,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// State shared between the handle and the ticker task
struct FlushState {
    backend: Arc<MemoryBackend>,
    path: PathBuf,
    file_lock: FileLock,

    /// Backend generation last written successfully
    flushed_generation: AtomicU64,

    /// Serializes ticks with forced flushes
    write_gate: tokio::sync::Mutex<()>,

    /// Message of the most recent failed flush
    last_error: Mutex<Option<String>>,
}

impl FlushScheduler {
    /// Load `path` into `backend`, then start ticking every `interval`
    ///
    /// A failed initial load is fatal: no task is spawned and the error is
    /// returned as `Startup`.
    pub async fn start(
        backend: Arc<MemoryBackend>,
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Result<Self> {
        let path = path.into();
        if interval.is_zero() {
            return Err(ShelfError::Config(
                "flush interval must be greater than zero".to_string(),
            ));
        }

        let documents = read_documents(&path).await.map_err(|e| {
            ShelfError::Startup(format!("initial load of {} failed: {}", path.display(), e))
        })?;
        let loaded = documents.len();
        backend.load(documents);

        let state = Arc::new(FlushState {
            flushed_generation: AtomicU64::new(backend.generation()),
            file_lock: FileLock::new(sidecar(&path, ".lock")),
            backend,
            path,
            write_gate: tokio::sync::Mutex::new(()),
            last_error: Mutex::new(None),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(Self::run(Arc::clone(&state), interval, shutdown_rx));

        tracing::info!(
            "Flush scheduler started for {} ({} documents loaded, every {:?})",
            state.path.display(),
            loaded,
            interval
        );

        Ok(Self {
            state,
            interval,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Ticker loop; the first tick fires one full interval after start
    async fn run(state: Arc<FlushState>, interval: Duration, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = state.flush_if_dirty().await {
                        tracing::warn!(
                            "Flush of {} failed, retrying next tick: {}",
                            state.path.display(),
                            e
                        );
                    }
                }
                _ = &mut shutdown => break,
            }
        }
    }

    /// Write the current in-memory set now, dirty or not
    pub async fn flush_now(&self) -> Result<()> {
        self.state.flush().await
    }

    /// Stop ticking, wait for an in-flight tick, then flush what is left
    pub async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Flush task for {} ended abnormally: {}", self.state.path.display(), e);
            }
        }

        let result = self.state.flush_if_dirty().await;
        tracing::info!("Flush scheduler stopped for {}", self.state.path.display());
        result
    }

    /// True while the ticker task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Whether memory holds changes not yet on disk
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Failure message of the most recent flush, cleared by a success
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl FlushState {
    fn is_dirty(&self) -> bool {
        self.backend.generation() != self.flushed_generation.load(Ordering::SeqCst)
    }

    async fn flush_if_dirty(&self) -> Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.flush().await
    }

    async fn flush(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let result = self.write_locked().await;

        match &result {
            Ok(generation) => {
                self.flushed_generation.store(*generation, Ordering::SeqCst);
                *self.last_error.lock() = None;
            }
            Err(e) => {
                *self.last_error.lock() = Some(e.to_string());
            }
        }
        result.map(|_| ())
    }

    /// Lock the file, write the current snapshot, return its generation
    async fn write_locked(&self) -> Result<u64> {
        let _lock = self.file_lock.lock().await?;
        let (documents, generation) = self.backend.snapshot_with_generation();
        write_documents(&self.path, &documents).await?;
        tracing::debug!(
            "Flushed {} documents to {} (generation {})",
            documents.len(),
            self.path.display(),
            generation
        );
        Ok(generation)
    }
}
