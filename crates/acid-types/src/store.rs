//! The contract every store adapter implements.

use acid_error::Result;

use crate::operation::Operation;
use crate::value::{Params, Payload};

/// Opaque handle to an open transaction.
///
/// Not `Clone`: [`TransactionalStore::commit`] and
/// [`TransactionalStore::abort`] consume it, so a transaction is resolved at
/// most once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TxHandle(u64);

impl TxHandle {
    /// Wrap an adapter-assigned transaction id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// A transactional store under test.
///
/// Implementations must be safe to call from many worker threads at once;
/// each open transaction is driven by exactly one thread.
pub trait TransactionalStore: Send + Sync {
    /// Short store name for reports and logs.
    fn name(&self) -> &str;

    /// Open a new transaction.
    fn begin(&self) -> Result<TxHandle>;

    /// Commit the transaction. A rejected commit returns
    /// `AcidError::TransactionAborted` and leaves no effects behind.
    fn commit(&self, tx: TxHandle) -> Result<()>;

    /// Roll the transaction back and release everything it holds.
    fn abort(&self, tx: TxHandle) -> Result<()>;

    /// Run one named operation inside the transaction.
    fn execute(&self, tx: &TxHandle, op: Operation, params: &Params) -> Result<Payload>;

    /// Delete all data. Returns once the deletion is visible to new
    /// transactions.
    fn wipe(&self) -> Result<()>;
}
