//! [`MemoryStore`]: the reference [`TransactionalStore`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use acid_error::{AcidError, Result};
use acid_types::{Operation, Params, Payload, TransactionalStore, TxHandle};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::{Graph, ItemKey, Mutation, UndoLog, WriteLocks};
use crate::ops;

// ---------------------------------------------------------------------------
// Isolation modes
// ---------------------------------------------------------------------------

/// Concurrency control used by a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// One transaction at a time: `begin` waits until the previous
    /// transaction has committed or aborted.
    Serializable,
    /// Reads come from a snapshot taken at `begin`; conflicting writers are
    /// resolved first-committer-wins. Admits write skew.
    SnapshotIsolation,
    /// Writes go straight to shared state and are undone on abort. A written
    /// item stays write-locked until its writer resolves, so dirty writes are
    /// rejected; every read anomaly is admitted.
    ReadUncommitted,
}

impl IsolationMode {
    pub const ALL: [Self; 3] = [
        Self::Serializable,
        Self::SnapshotIsolation,
        Self::ReadUncommitted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serializable => "serializable",
            Self::SnapshotIsolation => "snapshot-isolation",
            Self::ReadUncommitted => "read-uncommitted",
        }
    }

    /// Parse a mode name; `snapshot` is accepted for `snapshot-isolation`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "serializable" => Some(Self::Serializable),
            "snapshot" | "snapshot-isolation" => Some(Self::SnapshotIsolation),
            "read-uncommitted" => Some(Self::ReadUncommitted),
            _ => None,
        }
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Store state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Shared {
    graph: Graph,
    /// Commit sequence number of the last writer of each item.
    versions: HashMap<ItemKey, u64>,
    commit_seq: u64,
    /// Item write locks of transactions writing to `graph` directly.
    locks: WriteLocks,
}

#[derive(Debug)]
struct Snapshot {
    graph: Graph,
    start_seq: u64,
}

#[derive(Debug)]
struct TxState {
    undo: UndoLog,
    /// Private copy of the graph (snapshot isolation only).
    snapshot: Option<Snapshot>,
}

/// Commit/abort counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub commits: u64,
    pub aborts: u64,
    pub conflicts: u64,
}

/// In-process account/transfer graph store.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    mode: IsolationMode,
    shared: Mutex<Shared>,
    txns: Mutex<HashMap<u64, TxState>>,
    next_tx: AtomicU64,
    transfer_ids: AtomicU64,
    /// Transaction currently holding the store (serializable only).
    owner: Mutex<Option<u64>>,
    released: Condvar,
    commits: AtomicU64,
    aborts: AtomicU64,
    conflicts: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new(mode: IsolationMode) -> Self {
        Self {
            name: format!("memory-{mode}"),
            mode,
            shared: Mutex::new(Shared::default()),
            txns: Mutex::new(HashMap::new()),
            next_tx: AtomicU64::new(0),
            transfer_ids: AtomicU64::new(0),
            owner: Mutex::new(None),
            released: Condvar::new(),
            commits: AtomicU64::new(0),
            aborts: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> IsolationMode {
        self.mode
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
        }
    }

    /// Number of item write locks currently held.
    #[must_use]
    pub fn write_locks_held(&self) -> usize {
        self.shared.lock().locks.held()
    }

    /// Number of transactions currently open.
    #[must_use]
    pub fn open_transactions(&self) -> usize {
        self.txns.lock().len()
    }

    fn take_state(&self, id: u64) -> Result<TxState> {
        self.txns
            .lock()
            .remove(&id)
            .ok_or(AcidError::UnknownTransaction { handle: id })
    }

    fn acquire(&self, id: u64) {
        let mut owner = self.owner.lock();
        while owner.is_some() {
            self.released.wait(&mut owner);
        }
        *owner = Some(id);
    }

    fn release(&self, id: u64) {
        let mut owner = self.owner.lock();
        if *owner == Some(id) {
            *owner = None;
            self.released.notify_one();
        }
    }

    /// First-committer-wins validation, then install the written items.
    fn install(&self, id: u64, snapshot: &Snapshot, undo: &UndoLog) -> Result<()> {
        if undo.is_empty() {
            return Ok(());
        }
        let mut shared = self.shared.lock();
        let conflict = undo.keys().find(|key| {
            shared
                .versions
                .get(key)
                .is_some_and(|seq| *seq > snapshot.start_seq)
        });
        if let Some(key) = conflict {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
            debug!(store = %self.name, tx = id, ?key, "write-write conflict");
            return Err(AcidError::aborted(format!(
                "write-write conflict on {key:?}"
            )));
        }
        shared.commit_seq += 1;
        let seq = shared.commit_seq;
        for key in undo.keys() {
            let image = snapshot.graph.item(key);
            shared.graph.put(key, image);
            shared.versions.insert(key, seq);
        }
        Ok(())
    }
}

impl TransactionalStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&self) -> Result<TxHandle> {
        let id = self.next_tx.fetch_add(1, Ordering::Relaxed) + 1;
        if self.mode == IsolationMode::Serializable {
            self.acquire(id);
        }
        let snapshot = (self.mode == IsolationMode::SnapshotIsolation).then(|| {
            let shared = self.shared.lock();
            Snapshot {
                graph: shared.graph.clone(),
                start_seq: shared.commit_seq,
            }
        });
        self.txns.lock().insert(
            id,
            TxState {
                undo: UndoLog::default(),
                snapshot,
            },
        );
        debug!(store = %self.name, tx = id, "begin");
        Ok(TxHandle::new(id))
    }

    fn commit(&self, tx: TxHandle) -> Result<()> {
        let id = tx.id();
        let state = self.take_state(id)?;
        let result = match &state.snapshot {
            Some(snapshot) => self.install(id, snapshot, &state.undo),
            None => {
                self.shared.lock().locks.release(state.undo.keys(), id);
                Ok(())
            }
        };
        if self.mode == IsolationMode::Serializable {
            self.release(id);
        }
        match &result {
            Ok(()) => {
                self.commits.fetch_add(1, Ordering::Relaxed);
                debug!(store = %self.name, tx = id, "commit");
            }
            Err(_) => {
                self.aborts.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn abort(&self, tx: TxHandle) -> Result<()> {
        let id = tx.id();
        let state = self.take_state(id)?;
        if state.snapshot.is_none() {
            let mut guard = self.shared.lock();
            let shared = &mut *guard;
            shared.locks.release(state.undo.keys(), id);
            state.undo.rollback(&mut shared.graph);
        }
        if self.mode == IsolationMode::Serializable {
            self.release(id);
        }
        self.aborts.fetch_add(1, Ordering::Relaxed);
        debug!(store = %self.name, tx = id, "abort");
        Ok(())
    }

    fn execute(&self, tx: &TxHandle, op: Operation, params: &Params) -> Result<Payload> {
        let id = tx.id();
        let mut state = self.take_state(id)?;
        let result = match state.snapshot.as_mut() {
            Some(snapshot) => {
                let mut m = Mutation::new(&mut snapshot.graph, &mut state.undo, &self.transfer_ids);
                ops::apply(&mut m, op, params)
            }
            None => {
                let mut guard = self.shared.lock();
                let shared = &mut *guard;
                let mut m = Mutation::new(&mut shared.graph, &mut state.undo, &self.transfer_ids)
                    .with_write_locks(&mut shared.locks, id);
                ops::apply(&mut m, op, params)
            }
        };
        self.txns.lock().insert(id, state);
        result
    }

    fn wipe(&self) -> Result<()> {
        *self.shared.lock() = Shared::default();
        info!(store = %self.name, "store wiped");
        Ok(())
    }
}
