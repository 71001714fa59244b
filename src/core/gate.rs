//! Concurrency Gate and Scoped Task Groups
//!
//! Every external process the tool launches (clones and scans alike) is admitted
//! through a single [`ConcurrencyGate`]. The gate caps the number of running jobs
//! at a fixed capacity for the lifetime of the process. [`TaskGroup`] layers a
//! join barrier on top of the gate so that each scope (an organization's repos,
//! one user's repos and gists, ...) can wait for exactly the jobs it submitted.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Counting admission control shared by all coordinators
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    capacity: usize,
    stats: Arc<GateStats>,
}

#[derive(Debug, Default)]
struct GateStats {
    running: AtomicUsize,
    peak: AtomicUsize,
    admitted: AtomicUsize,
}

/// Tracks one running job; leaving the slot also happens when the job panics
struct RunningSlot(Arc<GateStats>);

impl RunningSlot {
    fn enter(stats: Arc<GateStats>) -> Self {
        let now_running = stats.running.fetch_add(1, Ordering::AcqRel) + 1;
        stats.peak.fetch_max(now_running, Ordering::AcqRel);
        Self(stats)
    }
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `capacity` concurrent jobs (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            stats: Arc::new(GateStats::default()),
        }
    }

    /// Submit a job for execution.
    ///
    /// Waits only while the gate is saturated. Once a slot is available the job
    /// is spawned onto the runtime and this returns immediately with its handle.
    /// The slot is released when the job finishes, whatever its outcome.
    /// Waiters are admitted in FIFO order, one per released slot.
    pub async fn submit<F, T>(&self, job: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("gate semaphore is never closed");

        let stats = Arc::clone(&self.stats);
        stats.admitted.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            let _permit = permit;
            let _slot = RunningSlot::enter(stats);
            job.await
        })
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently holding a slot
    pub fn running(&self) -> usize {
        self.stats.running.load(Ordering::Acquire)
    }

    /// Highest number of jobs observed running at the same time
    pub fn peak(&self) -> usize {
        self.stats.peak.load(Ordering::Acquire)
    }

    /// Total jobs admitted since the gate was created
    pub fn admitted(&self) -> usize {
        self.stats.admitted.load(Ordering::Relaxed)
    }

    /// Open a new task group bound to this gate
    pub fn group<T: Send + 'static>(&self, scope: impl Into<String>) -> TaskGroup<T> {
        TaskGroup::new(self.clone(), scope)
    }
}

/// Join barrier for the jobs of one scope.
///
/// `spawn` submits through the shared gate; `join` waits for every job spawned
/// on this instance. Nested scopes create their own group with [`TaskGroup::child`].
#[derive(Debug)]
pub struct TaskGroup<T = ()> {
    gate: ConcurrencyGate,
    scope: String,
    handles: Vec<JoinHandle<T>>,
}

/// Summary of a joined task group
#[derive(Debug)]
pub struct JoinReport<T> {
    pub scope: String,
    pub outputs: Vec<T>,
    /// Jobs that panicked instead of returning an output
    pub panicked: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Create a group for `scope` on the given gate
    pub fn new(gate: ConcurrencyGate, scope: impl Into<String>) -> Self {
        Self {
            gate,
            scope: scope.into(),
            handles: Vec::new(),
        }
    }

    /// Create a group for a nested scope sharing the same gate
    pub fn child<U: Send + 'static>(&self, scope: impl AsRef<str>) -> TaskGroup<U> {
        TaskGroup::new(
            self.gate.clone(),
            format!("{}/{}", self.scope, scope.as_ref()),
        )
    }

    /// Scope name this group was opened for
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Number of jobs spawned and not yet joined
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Submit a job through the gate and track it on this group
    pub async fn spawn<F>(&mut self, job: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let handle = self.gate.submit(job).await;
        self.handles.push(handle);
    }

    /// Wait for every job spawned on this group
    pub async fn join(self) -> JoinReport<T> {
        let mut outputs = Vec::with_capacity(self.handles.len());
        let mut panicked = 0;

        for handle in self.handles {
            match handle.await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    log::error!("Job in scope '{}' did not complete: {}", self.scope, e);
                    panicked += 1;
                }
            }
        }

        log::debug!(
            "Scope '{}' joined: {} completed, {} aborted",
            self.scope,
            outputs.len(),
            panicked
        );

        JoinReport {
            scope: self.scope,
            outputs,
            panicked,
        }
    }
}
