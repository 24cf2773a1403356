//! Bounded worker pool that runs a scenario's tasks against the store.
//!
//! Every task is built up front and submitted at once. Workers pull task
//! indices from a shared cursor and write each outcome into its own
//! write-once slot, so outcome `i` always belongs to task `i` regardless of
//! completion order. The caller waits for the pool to drain, bounded by one
//! overall timeout. On timeout the pool is cancelled: workers finish the task
//! they hold and take no further ones.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use acid_error::{AbortKind, AcidError, Result};
use acid_types::{AbortCause, TransactionOutcome, TransactionalStore};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::task::{Role, Sleeper, Task, TaskContext, WallClock};
use crate::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_POOL_SIZE};

/// How a scenario's tasks are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// One task at a time, in submission order, on the calling thread.
    Sequential,
    /// All tasks at once over the worker pool.
    Concurrent,
}

// ---------------------------------------------------------------------------
// Collected outcomes
// ---------------------------------------------------------------------------

/// Tasks and their outcomes, index-aligned with submission order.
#[derive(Debug, Clone)]
pub struct OrchestratedRun {
    tasks: Vec<Task>,
    outcomes: Vec<TransactionOutcome>,
    elapsed: Duration,
}

impl OrchestratedRun {
    /// Pair tasks with outcomes collected elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `AcidError::Internal` when the two lists differ in length.
    pub fn new(
        tasks: Vec<Task>,
        outcomes: Vec<TransactionOutcome>,
        elapsed: Duration,
    ) -> Result<Self> {
        if tasks.len() != outcomes.len() {
            return Err(AcidError::Internal(format!(
                "{} tasks but {} outcomes",
                tasks.len(),
                outcomes.len()
            )));
        }
        Ok(Self {
            tasks,
            outcomes,
            elapsed,
        })
    }

    #[must_use]
    pub fn submitted(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn aborted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_aborted()).count()
    }

    #[must_use]
    pub fn committed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_committed()).count()
    }

    #[must_use]
    pub fn adapter_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_adapter_failure())
            .count()
    }

    #[must_use]
    pub fn missing_fixtures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_missing_fixture())
            .count()
    }

    #[must_use]
    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    #[must_use]
    pub fn outcome(&self, index: usize) -> Option<&TransactionOutcome> {
        self.outcomes.get(index)
    }

    /// `(index, task, outcome)` in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Task, &TransactionOutcome)> {
        self.tasks
            .iter()
            .zip(&self.outcomes)
            .enumerate()
            .map(|(index, (task, outcome))| (index, task, outcome))
    }

    /// Entries whose task has the given role.
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = (usize, &Task, &TransactionOutcome)> {
        self.iter().filter(move |(_, task, _)| task.role == role)
    }

    #[must_use]
    pub fn aborted_by_role(&self, role: Role) -> usize {
        self.by_role(role).filter(|(_, _, o)| o.is_aborted()).count()
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

struct Progress {
    done: Mutex<usize>,
    drained: Condvar,
}

impl Progress {
    fn finish_one(&self) {
        let mut done = self.done.lock();
        *done += 1;
        self.drained.notify_all();
    }
}

/// Runs task lists over a bounded worker pool.
#[derive(Clone)]
pub struct Orchestrator {
    pool_size: usize,
    drain_timeout: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pool_size", &self.pool_size)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Pool of `pool_size` workers (at least one) with wall-clock delays.
    #[must_use]
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size: pool_size.max(1),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            sleeper: Arc::new(WallClock),
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub const fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Run every task and collect one outcome per task.
    ///
    /// # Errors
    ///
    /// Task failures never surface here; they are recorded as aborted
    /// outcomes. Returns `AcidError::DrainTimeout` if the pool does not
    /// finish in time and `AcidError::Io` if a worker cannot be spawned.
    pub fn run(
        &self,
        store: &Arc<dyn TransactionalStore>,
        tasks: Vec<Task>,
        schedule: Schedule,
    ) -> Result<OrchestratedRun> {
        let started = Instant::now();
        let outcomes = match schedule {
            Schedule::Sequential => tasks
                .iter()
                .enumerate()
                .map(|(index, task)| run_task(store.as_ref(), self.sleeper.as_ref(), index, task))
                .collect(),
            Schedule::Concurrent => self.run_pool(store, &tasks)?,
        };
        let run = OrchestratedRun::new(tasks, outcomes, started.elapsed())?;
        info!(
            store = store.name(),
            ?schedule,
            submitted = run.submitted(),
            aborted = run.aborted(),
            elapsed_ms = run.elapsed().as_millis() as u64,
            "task list drained"
        );
        Ok(run)
    }

    fn run_pool(
        &self,
        store: &Arc<dyn TransactionalStore>,
        tasks: &[Task],
    ) -> Result<Vec<TransactionOutcome>> {
        let total = tasks.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let shared_tasks: Arc<[Task]> = tasks.into();
        let slots: Arc<[OnceLock<TransactionOutcome>]> =
            (0..total).map(|_| OnceLock::new()).collect();
        let cursor = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(Progress {
            done: Mutex::new(0),
            drained: Condvar::new(),
        });

        let workers = self.pool_size.min(total);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let tasks = Arc::clone(&shared_tasks);
            let slots = Arc::clone(&slots);
            let cursor = Arc::clone(&cursor);
            let cancelled = Arc::clone(&cancelled);
            let progress = Arc::clone(&progress);
            let store = Arc::clone(store);
            let sleeper = Arc::clone(&self.sleeper);
            let handle = thread::Builder::new()
                .name(format!("acid-worker-{worker}"))
                .spawn(move || {
                    while !cancelled.load(Ordering::Acquire) {
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(task) = tasks.get(index) else {
                            break;
                        };
                        let outcome = run_task(store.as_ref(), sleeper.as_ref(), index, task);
                        if slots[index].set(outcome).is_err() {
                            warn!(task = index, "outcome slot written twice");
                        }
                        progress.finish_one();
                    }
                })?;
            handles.push(handle);
        }

        let deadline = Instant::now() + self.drain_timeout;
        {
            let mut done = progress.done.lock();
            while *done < total {
                if progress.drained.wait_until(&mut done, deadline).timed_out() && *done < total {
                    cancelled.store(true, Ordering::Release);
                    warn!(
                        unresolved = total - *done,
                        "pool cancelled; in-flight tasks keep running against the store"
                    );
                    return Err(AcidError::DrainTimeout {
                        timeout_secs: self.drain_timeout.as_secs(),
                        unresolved: total - *done,
                    });
                }
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread exited by panic");
            }
        }

        slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.get()
                    .cloned()
                    .ok_or_else(|| AcidError::Internal(format!("task {index} left no outcome")))
            })
            .collect()
    }
}

/// Run one task, turning every failure (including a panic) into an aborted
/// outcome.
fn run_task(
    store: &dyn TransactionalStore,
    sleeper: &dyn Sleeper,
    index: usize,
    task: &Task,
) -> TransactionOutcome {
    let ctx = TaskContext::new(store, sleeper);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        task.program.run(&ctx, &task.params, task.delay)
    }));
    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            if matches!(err.abort_kind(), AbortKind::Adapter) {
                warn!(task = index, program = task.program.as_str(), error = %err, "adapter error");
            }
            TransactionOutcome::from(&err)
        }
        Err(_) => TransactionOutcome::Aborted(AbortCause::Adapter {
            detail: format!("task {index} panicked"),
        }),
    };
    debug!(
        task = index,
        role = %task.role,
        program = task.program.as_str(),
        committed = outcome.is_committed(),
        "task resolved"
    );
    outcome
}
