//! Account/transfer graph and the undo log that makes writes reversible.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use acid_error::{AcidError, Result};
use acid_types::{AccountId, Operation};

/// An account vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: Option<String>,
    pub balance: Option<i64>,
    pub trans_history: Vec<i64>,
    pub version_history: Vec<i64>,
    pub num_transferred: i64,
}

impl Account {
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_balance(id: AccountId, balance: i64) -> Self {
        Self {
            id,
            balance: Some(balance),
            ..Self::default()
        }
    }
}

/// A directed transfer edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: u64,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Option<i64>,
    pub version_history: Vec<i64>,
}

/// Identity of a versioned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKey {
    Account(AccountId),
    Transfer(u64),
}

/// A before- or after-image of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Account(Account),
    Transfer(Transfer),
}

/// The whole store contents.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub accounts: BTreeMap<AccountId, Account>,
    pub transfers: BTreeMap<u64, Transfer>,
}

impl Graph {
    /// Current image of an item, `None` if it does not exist.
    #[must_use]
    pub fn item(&self, key: ItemKey) -> Option<Item> {
        match key {
            ItemKey::Account(id) => self.accounts.get(&id).cloned().map(Item::Account),
            ItemKey::Transfer(id) => self.transfers.get(&id).cloned().map(Item::Transfer),
        }
    }

    /// Install an item image; `None` removes the item.
    pub fn put(&mut self, key: ItemKey, image: Option<Item>) {
        match (key, image) {
            (ItemKey::Account(id), Some(Item::Account(account))) => {
                self.accounts.insert(id, account);
            }
            (ItemKey::Account(id), _) => {
                self.accounts.remove(&id);
            }
            (ItemKey::Transfer(id), Some(Item::Transfer(transfer))) => {
                self.transfers.insert(id, transfer);
            }
            (ItemKey::Transfer(id), _) => {
                self.transfers.remove(&id);
            }
        }
    }

    pub fn account(&self, id: AccountId, op: Operation) -> Result<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| AcidError::empty_result(op.as_str()))
    }

    /// First outgoing transfer of `from` (lowest edge id), optionally
    /// restricted to a destination.
    #[must_use]
    pub fn outgoing(&self, from: AccountId, to: Option<AccountId>) -> Option<&Transfer> {
        self.transfers
            .values()
            .find(|t| t.from == from && to.is_none_or(|to| t.to == to))
    }

    /// Account ids on the transfer cycle that starts at `start`, in
    /// traversal order.
    pub fn cycle_from(&self, start: AccountId, op: Operation) -> Result<Vec<AccountId>> {
        self.account(start, op)?;
        let mut ids = vec![start];
        let mut current = start;
        loop {
            let next = self
                .outgoing(current, None)
                .ok_or_else(|| AcidError::empty_result(op.as_str()))?
                .to;
            if next == start {
                return Ok(ids);
            }
            if ids.len() > self.accounts.len() {
                return Err(AcidError::Internal(format!(
                    "transfer path from account {start} does not close"
                )));
            }
            ids.push(next);
            current = next;
        }
    }
}

/// Before-images of every item a transaction touched, first touch wins.
#[derive(Debug, Default)]
pub struct UndoLog {
    entries: Vec<(ItemKey, Option<Item>)>,
    touched: HashSet<ItemKey>,
}

impl UndoLog {
    pub fn record(&mut self, graph: &Graph, key: ItemKey) {
        if self.touched.insert(key) {
            self.entries.push((key, graph.item(key)));
        }
    }

    /// Keys written by the transaction, in first-touch order.
    pub fn keys(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore every before-image into `graph`.
    pub fn rollback(self, graph: &mut Graph) {
        for (key, image) in self.entries.into_iter().rev() {
            graph.put(key, image);
        }
    }
}

/// Item write locks, each held by one transaction until it commits or
/// aborts. A second writer is rejected instead of waiting.
#[derive(Debug, Default)]
pub struct WriteLocks {
    holders: HashMap<ItemKey, u64>,
}

impl WriteLocks {
    pub fn acquire(&mut self, key: ItemKey, tx: u64) -> Result<()> {
        match self.holders.entry(key) {
            Entry::Occupied(holder) if *holder.get() != tx => Err(AcidError::aborted(format!(
                "{key:?} is write-locked by transaction {}",
                holder.get()
            ))),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(())
            }
        }
    }

    /// Release the locks `tx` holds on `keys`.
    pub fn release(&mut self, keys: impl IntoIterator<Item = ItemKey>, tx: u64) {
        for key in keys {
            if self.holders.get(&key) == Some(&tx) {
                self.holders.remove(&key);
            }
        }
    }

    #[must_use]
    pub fn held(&self) -> usize {
        self.holders.len()
    }
}

/// Write access to a graph that records before-images as it goes.
pub struct Mutation<'a> {
    pub graph: &'a mut Graph,
    undo: &'a mut UndoLog,
    transfer_ids: &'a AtomicU64,
    locks: Option<(&'a mut WriteLocks, u64)>,
}

impl<'a> Mutation<'a> {
    pub fn new(graph: &'a mut Graph, undo: &'a mut UndoLog, transfer_ids: &'a AtomicU64) -> Self {
        Self {
            graph,
            undo,
            transfer_ids,
            locks: None,
        }
    }

    /// Lock every item for `tx` before its first write.
    #[must_use]
    pub fn with_write_locks(mut self, locks: &'a mut WriteLocks, tx: u64) -> Self {
        self.locks = Some((locks, tx));
        self
    }

    fn touch(&mut self, key: ItemKey) -> Result<()> {
        if let Some((locks, tx)) = self.locks.as_mut() {
            locks.acquire(key, *tx)?;
        }
        self.undo.record(&*self.graph, key);
        Ok(())
    }

    pub fn account_mut(&mut self, id: AccountId, op: Operation) -> Result<&mut Account> {
        if !self.graph.accounts.contains_key(&id) {
            return Err(AcidError::empty_result(op.as_str()));
        }
        self.touch(ItemKey::Account(id))?;
        self.graph
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AcidError::empty_result(op.as_str()))
    }

    pub fn transfer_mut(&mut self, id: u64, op: Operation) -> Result<&mut Transfer> {
        if !self.graph.transfers.contains_key(&id) {
            return Err(AcidError::empty_result(op.as_str()));
        }
        self.touch(ItemKey::Transfer(id))?;
        self.graph
            .transfers
            .get_mut(&id)
            .ok_or_else(|| AcidError::empty_result(op.as_str()))
    }

    /// Insert a new account. Account ids are unique: a duplicate aborts.
    pub fn create_account(&mut self, account: Account) -> Result<()> {
        if self.graph.accounts.contains_key(&account.id) {
            return Err(AcidError::aborted(format!(
                "unique constraint: account {} already exists",
                account.id
            )));
        }
        self.touch(ItemKey::Account(account.id))?;
        self.graph.accounts.insert(account.id, account);
        Ok(())
    }

    /// Insert a new transfer edge and return its id.
    pub fn create_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Option<i64>,
        version_history: Vec<i64>,
    ) -> Result<u64> {
        let id = self.transfer_ids.fetch_add(1, Ordering::Relaxed) + 1;
        self.touch(ItemKey::Transfer(id))?;
        self.graph.transfers.insert(
            id,
            Transfer {
                id,
                from,
                to,
                amount,
                version_history,
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_graph() -> Graph {
        let mut graph = Graph::default();
        let mut undo = UndoLog::default();
        let ids = AtomicU64::new(0);
        let mut m = Mutation::new(&mut graph, &mut undo, &ids);
        for id in 1..=4 {
            m.create_account(Account::with_balance(id, 0)).unwrap();
        }
        for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
            m.create_transfer(from, to, None, Vec::new()).unwrap();
        }
        graph
    }

    #[test]
    fn cycle_traversal_starts_anywhere() {
        let graph = cycle_graph();
        assert_eq!(
            graph.cycle_from(1, Operation::OtvRead).unwrap(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            graph.cycle_from(3, Operation::OtvRead).unwrap(),
            vec![3, 4, 1, 2]
        );
        let err = graph.cycle_from(9, Operation::OtvRead).unwrap_err();
        assert!(matches!(err, AcidError::EmptyResult { .. }), "got={err}");
    }

    #[test]
    fn rollback_restores_before_images() {
        let mut graph = cycle_graph();
        let original = graph.clone();
        let mut undo = UndoLog::default();
        let ids = AtomicU64::new(100);
        {
            let mut m = Mutation::new(&mut graph, &mut undo, &ids);
            m.account_mut(1, Operation::OtvWrite).unwrap().balance = Some(5);
            m.account_mut(1, Operation::OtvWrite).unwrap().balance = Some(6);
            m.create_account(Account::new(10)).unwrap();
            m.create_transfer(1, 10, Some(3), Vec::new()).unwrap();
        }
        assert_eq!(undo.keys().count(), 3);
        assert_eq!(graph.accounts[&1].balance, Some(6));

        undo.rollback(&mut graph);
        assert_eq!(graph.accounts, original.accounts);
        assert_eq!(graph.transfers, original.transfers);
    }

    #[test]
    fn write_locks_reject_second_writer() {
        let mut graph = cycle_graph();
        let mut locks = WriteLocks::default();
        let ids = AtomicU64::new(100);
        let mut first = UndoLog::default();
        Mutation::new(&mut graph, &mut first, &ids)
            .with_write_locks(&mut locks, 1)
            .account_mut(1, Operation::ImpWrite)
            .unwrap()
            .balance = Some(7);

        let mut second = UndoLog::default();
        let err = Mutation::new(&mut graph, &mut second, &ids)
            .with_write_locks(&mut locks, 2)
            .account_mut(1, Operation::ImpWrite)
            .unwrap_err();
        assert!(err.is_abort(), "got={err}");
        assert!(second.is_empty());

        locks.release(first.keys(), 1);
        assert_eq!(locks.held(), 0);
        Mutation::new(&mut graph, &mut second, &ids)
            .with_write_locks(&mut locks, 2)
            .account_mut(1, Operation::ImpWrite)
            .unwrap();
        assert_eq!(locks.held(), 1);
    }

    #[test]
    fn duplicate_account_is_rejected() {
        let mut graph = cycle_graph();
        let mut undo = UndoLog::default();
        let ids = AtomicU64::new(0);
        let mut m = Mutation::new(&mut graph, &mut undo, &ids);
        let err = m.create_account(Account::new(2)).unwrap_err();
        assert!(err.is_abort(), "got={err}");
        assert!(undo.is_empty());
    }
}
