//! Background execution shared by front ends.
//!
//! Loads and exports run off the interactive thread. Only one job may be in
//! flight: `LoadingFlag` is the "loading in progress" switch front ends check
//! before offering further actions, and `BackgroundRunner` refuses new work
//! while it is set. There is no cancellation; a started job runs to the end.

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

#[derive(Clone, Debug, Default)]
/// Shared "loading in progress" switch.
pub struct LoadingFlag {
    busy: Arc<AtomicBool>,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the flag; `None` when another job already holds it.
    pub fn try_begin(&self) -> Option<LoadingGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Clears the loading flag when dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Runs one job at a time on a dedicated worker thread.
#[derive(Clone, Debug, Default)]
pub struct BackgroundRunner {
    flag: LoadingFlag,
}

impl BackgroundRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> &LoadingFlag {
        &self.flag
    }

    /// Start `job` on a worker thread; `Ok(None)` when a job is already running.
    pub fn spawn<T, F>(&self, name: &str, job: F) -> Result<Option<JobHandle<T>>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let Some(guard) = self.flag.try_begin() else {
            tracing::debug!(job = name, "loading in progress; job refused");
            return Ok(None);
        };
        let handle = thread::Builder::new()
            .name(format!("icondigger-{name}"))
            .spawn(move || {
                let _guard = guard;
                job()
            })
            .with_context(|| format!("spawning worker for {name}"))?;
        Ok(Some(JobHandle { handle }))
    }
}

/// Handle to a running background job.
pub struct JobHandle<T> {
    handle: JoinHandle<T>,
}

impl<T> JobHandle<T> {
    /// Block until the job completes and return its value.
    pub fn wait(self) -> Result<T> {
        self.handle
            .join()
            .map_err(|_| anyhow!("background job panicked"))
    }
}
