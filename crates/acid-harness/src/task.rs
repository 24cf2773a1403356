//! Tasks, the in-transaction delay hook, and the transaction guard.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use acid_error::{AcidError, Result};
use acid_types::{Operation, Params, Payload, TransactionalStore, TxHandle};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::programs::Program;

// ---------------------------------------------------------------------------
// Roles and tasks
// ---------------------------------------------------------------------------

/// Whether a task mutates the scenario fixture or only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Writer,
    Reader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Writer => "writer",
            Self::Reader => "reader",
        })
    }
}

/// One unit of work submitted to the orchestrator: a transaction program
/// bound to concrete parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub role: Role,
    pub program: Program,
    pub params: Params,
    /// Race-widening pause taken inside the open transaction.
    pub delay: Duration,
}

impl Task {
    #[must_use]
    pub fn writer(program: Program, params: Params) -> Self {
        Self {
            role: Role::Writer,
            program,
            params,
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn reader(program: Program, params: Params) -> Self {
        Self {
            role: Role::Reader,
            program,
            params,
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

// ---------------------------------------------------------------------------
// Delay hook
// ---------------------------------------------------------------------------

/// Pauses a task inside its open transaction.
pub trait Sleeper: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// Real wall-clock pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Sleeper for WallClock {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Records requested pauses without blocking.
#[derive(Debug, Default)]
pub struct VirtualClock {
    elapsed: Mutex<Duration>,
    pauses: AtomicUsize,
}

impl VirtualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every requested pause.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }

    /// Number of pause calls.
    #[must_use]
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::Relaxed)
    }
}

impl Sleeper for VirtualClock {
    fn pause(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
        self.pauses.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Transaction guard
// ---------------------------------------------------------------------------

/// An open transaction. Dropping it without [`Txn::commit`] or
/// [`Txn::abort`] aborts it.
pub struct Txn<'a> {
    store: &'a dyn TransactionalStore,
    handle: Option<TxHandle>,
}

impl<'a> Txn<'a> {
    pub fn begin(store: &'a dyn TransactionalStore) -> Result<Self> {
        let handle = store.begin()?;
        Ok(Self {
            store,
            handle: Some(handle),
        })
    }

    fn handle(&self) -> Result<&TxHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| AcidError::Internal("transaction already resolved".to_owned()))
    }

    pub fn execute(&self, op: Operation, params: &Params) -> Result<Payload> {
        self.store.execute(self.handle()?, op, params)
    }

    pub fn commit(mut self) -> Result<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| AcidError::Internal("transaction already resolved".to_owned()))?;
        self.store.commit(handle)
    }

    pub fn abort(mut self) -> Result<()> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| AcidError::Internal("transaction already resolved".to_owned()))?;
        self.store.abort(handle)
    }
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let id = handle.id();
            if let Err(err) = self.store.abort(handle) {
                warn!(store = self.store.name(), tx = id, error = %err, "abort of abandoned transaction failed");
            }
        }
    }
}

impl fmt::Debug for Txn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Txn")
            .field("store", &self.store.name())
            .field("handle", &self.handle)
            .finish()
    }
}

/// What a running transaction program can reach: the store and the delay
/// hook.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    store: &'a dyn TransactionalStore,
    sleeper: &'a dyn Sleeper,
}

impl<'a> TaskContext<'a> {
    #[must_use]
    pub fn new(store: &'a dyn TransactionalStore, sleeper: &'a dyn Sleeper) -> Self {
        Self { store, sleeper }
    }

    pub fn begin(&self) -> Result<Txn<'a>> {
        Txn::begin(self.store)
    }

    pub fn pause(&self, duration: Duration) {
        self.sleeper.pause(duration);
    }
}
