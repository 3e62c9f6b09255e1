//! Fixed-size barrier-dispatch worker pool.
//!
//! Workers are spawned once and parked. [`WorkerPool::dispatch`] wakes every worker, lets them
//! claim job indices from a shared atomic counter until the configured domain is exhausted, and
//! blocks the caller until the last worker has reported back. The per-job path touches only two
//! atomics; mutexes are used only to park and wake workers.

use std::{
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crate::foundation::error::PoolError;

/// Job callback: `(job_index, worker_id)`.
///
/// Jobs must be write-disjoint: completion order across workers is unspecified.
pub type JobFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Number of hardware threads, falling back to 1 when the platform cannot tell.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

/// Summary of one completed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchStats {
    /// Job indices handed to the job function.
    pub jobs: usize,
    /// Workers that took part.
    pub workers: usize,
    /// Wall time from wake-up to the completion barrier.
    pub elapsed: Duration,
}

/// Wait/signal handle built on an epoch counter.
///
/// A notification bumps the epoch, so a waiter that arrives late still observes it and no wake-up
/// is lost between `notify` and `wait_past`.
struct Signal {
    epoch: Mutex<u64>,
    cv: Condvar,
}

impl Signal {
    fn new() -> Self {
        Self {
            epoch: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        // Nothing panics while holding this lock, so a poisoned epoch is still consistent.
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> u64 {
        *self.lock()
    }

    fn notify(&self) {
        let mut epoch = self.lock();
        *epoch = epoch.wrapping_add(1);
        self.cv.notify_all();
    }

    /// Block until the epoch differs from `seen`; returns the new epoch.
    fn wait_past(&self, seen: u64) -> u64 {
        let mut epoch = self.lock();
        while *epoch == seen {
            epoch = self.cv.wait(epoch).unwrap_or_else(PoisonError::into_inner);
        }
        *epoch
    }
}

#[derive(Clone)]
struct JobSpec {
    func: JobFn,
    count: usize,
}

struct Shared {
    next_job: AtomicUsize,
    active: AtomicUsize,
    alive: AtomicBool,
    cancel: AtomicBool,
    poisoned: AtomicBool,
    panicked: AtomicUsize,
    job: Mutex<Option<JobSpec>>,
    wake: Vec<Signal>,
    done: Signal,
}

impl Shared {
    fn job(&self) -> Option<JobSpec> {
        self.job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Report one worker on the completion barrier. The last one releases the dispatcher.
    fn report(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.done.notify();
        }
    }

    fn run_jobs(&self, worker: usize, job: &JobSpec) {
        loop {
            if self.cancel.load(Ordering::Acquire) {
                break;
            }
            let idx = self.next_job.fetch_add(1, Ordering::Relaxed);
            if idx >= job.count {
                break;
            }
            (job.func)(idx, worker);
        }
    }
}

/// Reports a worker whose job function unwound, so the dispatcher is never left waiting on a dead
/// thread. The pool is poisoned afterwards.
struct UnwindReport<'a>(&'a Shared);

impl Drop for UnwindReport<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.poisoned.store(true, Ordering::Release);
            self.0.panicked.fetch_add(1, Ordering::AcqRel);
            self.0.report();
        }
    }
}

fn worker_main(shared: Arc<Shared>, id: usize) {
    let mut seen = 0u64;
    loop {
        seen = shared.wake[id].wait_past(seen);
        if !shared.alive.load(Ordering::Acquire) {
            break;
        }

        let guard = UnwindReport(&shared);
        if let Some(job) = shared.job() {
            shared.run_jobs(id, &job);
        }
        drop(guard);

        shared.report();
    }

    // Shutdown acknowledgement.
    shared.report();
}

/// Fixed set of long-lived worker threads driven by a single dispatcher.
///
/// `configure`, `dispatch`, `cancel` and `shutdown` take `&mut self`, so only one thread can
/// drive the pool and job state is never mutated while a dispatch is in flight.
pub struct WorkerPool {
    shared: Arc<Shared>,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `workers` parked threads.
    ///
    /// Thread creation failure is fatal: workers spawned so far are shut down and the error is
    /// returned to the caller.
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        if workers == 0 {
            return Err(PoolError::InvalidWorkerCount);
        }

        let shared = Arc::new(Shared {
            next_job: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            alive: AtomicBool::new(true),
            cancel: AtomicBool::new(false),
            poisoned: AtomicBool::new(false),
            panicked: AtomicUsize::new(0),
            job: Mutex::new(None),
            wake: (0..workers).map(|_| Signal::new()).collect(),
            done: Signal::new(),
        });

        let mut pool = Self {
            shared,
            handles: Vec::with_capacity(workers),
            workers: 0,
        };

        for id in 0..workers {
            let shared = Arc::clone(&pool.shared);
            let spawned = std::thread::Builder::new()
                .name(format!("brotpool-worker-{id}"))
                .spawn(move || worker_main(shared, id));
            match spawned {
                Ok(handle) => {
                    pool.handles.push(handle);
                    pool.workers += 1;
                }
                Err(source) => {
                    tracing::error!(worker = id, error = %source, "worker spawn failed");
                    pool.shutdown();
                    return Err(PoolError::Spawn { worker: id, source });
                }
            }
        }

        tracing::debug!(workers, "worker pool started");
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Configured job domain size, or `None` before the first `configure`.
    pub fn job_count(&self) -> Option<usize> {
        self.shared.job().map(|j| j.count)
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    /// Install the job function and domain size for subsequent dispatches.
    ///
    /// Clears a pending [`cancel`](Self::cancel).
    pub fn configure(&mut self, func: JobFn, count: usize) {
        *self
            .shared
            .job
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(JobSpec { func, count });
        self.shared.cancel.store(false, Ordering::Release);
    }

    /// Request cooperative cancellation. Workers check the flag before every claim, so the next
    /// dispatch completes without invoking the job function.
    pub fn cancel(&mut self) {
        self.shared.cancel.store(true, Ordering::Release);
    }

    /// Run the configured job function over `[0, job_count)` and block until every worker has
    /// returned to idle.
    pub fn dispatch(&mut self) -> Result<DispatchStats, PoolError> {
        if !self.is_alive() {
            return Err(PoolError::ShutDown);
        }
        if self.shared.poisoned.load(Ordering::Acquire) {
            return Err(PoolError::WorkerPanicked);
        }
        let job = self.shared.job().ok_or(PoolError::NotConfigured)?;
        let cancelled = self.shared.cancel.load(Ordering::Acquire);

        let start = Instant::now();
        self.shared.next_job.store(0, Ordering::Relaxed);
        self.shared.active.store(self.workers, Ordering::Release);

        let seen = self.shared.done.current();
        for wake in &self.shared.wake[..self.workers] {
            wake.notify();
        }
        self.shared.done.wait_past(seen);

        if self.shared.poisoned.load(Ordering::Acquire) {
            tracing::warn!("job function panicked during dispatch");
            return Err(PoolError::WorkerPanicked);
        }

        let stats = DispatchStats {
            jobs: if cancelled { 0 } else { job.count },
            workers: self.workers,
            elapsed: start.elapsed(),
        };
        tracing::debug!(
            jobs = stats.jobs,
            workers = stats.workers,
            ms = stats.elapsed.as_secs_f64() * 1e3,
            "dispatch complete"
        );
        Ok(stats)
    }

    /// Stop and join every worker. Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        if !self.shared.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        self.shared.cancel.store(true, Ordering::Release);

        let live = self
            .workers
            .saturating_sub(self.shared.panicked.load(Ordering::Acquire));
        if live > 0 {
            self.shared.active.store(live, Ordering::Release);
            let seen = self.shared.done.current();
            for wake in &self.shared.wake[..self.workers] {
                wake.notify();
            }
            self.shared.done.wait_past(seen);
        }

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread exited with a panic");
            }
        }
        tracing::debug!(workers = self.workers, "worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("alive", &self.is_alive())
            .field("job_count", &self.job_count())
            .finish()
    }
}
