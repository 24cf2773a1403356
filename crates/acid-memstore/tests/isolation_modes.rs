//! Behaviour of each isolation mode of the reference store.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use acid_memstore::{IsolationMode, MemoryStore};
use acid_types::{Operation, Params, TransactionalStore};
use proptest::prelude::*;

fn account(id: i64) -> Params {
    Params::new().with("accountId", id)
}

fn seeded(mode: IsolationMode, init: Operation) -> MemoryStore {
    let store = MemoryStore::new(mode);
    let tx = store.begin().expect("begin init");
    store.execute(&tx, init, &Params::new()).expect("init");
    store.commit(tx).expect("commit init");
    store
}

fn read_balance(store: &MemoryStore, op: Operation) -> i64 {
    let tx = store.begin().expect("begin read");
    let payload = store.execute(&tx, op, &account(1)).expect("read");
    store.commit(tx).expect("commit read");
    payload.int("aBalance").or_else(|_| payload.int("balance")).expect("balance field")
}

#[test]
fn serializable_begin_waits_for_open_transaction() {
    let store = Arc::new(seeded(IsolationMode::Serializable, Operation::G1bInit));
    let first = store.begin().expect("begin first");

    let (sender, receiver) = mpsc::channel();
    let waiter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            let tx = store.begin().expect("begin second");
            sender.send(()).expect("signal");
            store.commit(tx).expect("commit second");
        })
    };

    assert!(
        receiver.recv_timeout(Duration::from_millis(100)).is_err(),
        "second transaction started while the first was open"
    );
    store.commit(first).expect("commit first");
    receiver
        .recv_timeout(Duration::from_secs(5))
        .expect("second transaction never started");
    waiter.join().expect("waiter thread");
}

#[test]
fn serializable_abort_restores_state() {
    let store = seeded(IsolationMode::Serializable, Operation::G1aInit);
    let tx = store.begin().unwrap();
    let write = Params::new().with("internalId", 1_i64).with("balance", 200_i64);
    store.execute(&tx, Operation::G1aWrite, &write).unwrap();
    store.abort(tx).unwrap();
    assert_eq!(read_balance(&store, Operation::G1aRead), 99);
}

#[test]
fn read_uncommitted_exposes_dirty_writes() {
    let store = seeded(IsolationMode::ReadUncommitted, Operation::G1aInit);
    let writer = store.begin().unwrap();
    let write = Params::new().with("internalId", 1_i64).with("balance", 200_i64);
    store.execute(&writer, Operation::G1aWrite, &write).unwrap();

    assert_eq!(read_balance(&store, Operation::G1aRead), 200);

    store.abort(writer).unwrap();
    assert_eq!(read_balance(&store, Operation::G1aRead), 99);
}

#[test]
fn read_uncommitted_abort_keeps_interleaved_commits() {
    let store = seeded(IsolationMode::ReadUncommitted, Operation::ImpInit);
    let base = read_balance(&store, Operation::ImpRead);

    let first = store.begin().unwrap();
    let second = store.begin().unwrap();
    store.execute(&first, Operation::ImpWrite, &account(1)).unwrap();
    let err = store
        .execute(&second, Operation::ImpWrite, &account(1))
        .unwrap_err();
    assert!(err.is_abort(), "dirty write admitted: got={err}");
    store.abort(second).unwrap();
    store.commit(first).unwrap();

    let third = store.begin().unwrap();
    let fourth = store.begin().unwrap();
    store.execute(&third, Operation::ImpWrite, &account(1)).unwrap();
    store.commit(third).unwrap();
    store.execute(&fourth, Operation::ImpWrite, &account(1)).unwrap();
    store.abort(fourth).unwrap();

    assert_eq!(read_balance(&store, Operation::ImpRead), base + 2);
    assert_eq!(store.write_locks_held(), 0);
    assert_eq!(store.open_transactions(), 0);
}

#[test]
fn snapshot_reads_are_stable() {
    let store = seeded(IsolationMode::SnapshotIsolation, Operation::ImpInit);
    let reader = store.begin().unwrap();
    let first = store
        .execute(&reader, Operation::ImpRead, &account(1))
        .unwrap()
        .int("balance")
        .unwrap();

    let writer = store.begin().unwrap();
    store.execute(&writer, Operation::ImpWrite, &account(1)).unwrap();
    store.commit(writer).unwrap();

    let second = store
        .execute(&reader, Operation::ImpRead, &account(1))
        .unwrap()
        .int("balance")
        .unwrap();
    store.commit(reader).unwrap();
    assert_eq!(first, second);
    assert_eq!(read_balance(&store, Operation::ImpRead), 2);
}

#[test]
fn snapshot_first_committer_wins() {
    let store = seeded(IsolationMode::SnapshotIsolation, Operation::ImpInit);
    let a = store.begin().unwrap();
    let b = store.begin().unwrap();
    store.execute(&a, Operation::ImpWrite, &account(1)).unwrap();
    store.execute(&b, Operation::ImpWrite, &account(1)).unwrap();
    store.commit(a).unwrap();
    let err = store.commit(b).unwrap_err();
    assert!(err.is_abort(), "got={err}");
    assert_eq!(store.stats().conflicts, 1);
    assert_eq!(read_balance(&store, Operation::ImpRead), 2);
}

#[test]
fn snapshot_admits_write_skew() {
    let store = seeded(IsolationMode::SnapshotIsolation, Operation::WsInit);
    let pair = Params::new().with("account1Id", 1_i64).with("account2Id", 2_i64);
    let a = store.begin().unwrap();
    let b = store.begin().unwrap();
    for tx in [&a, &b] {
        let payload = store.execute(tx, Operation::WsRead, &pair).unwrap();
        let sum = payload.int("a1Balance").unwrap() + payload.int("a2Balance").unwrap();
        assert_eq!(sum, 150);
    }
    let withdraw = |id: i64| Params::new().with("accountId", id).with("amount", 100_i64);
    store.execute(&a, Operation::WsWithdraw, &withdraw(1)).unwrap();
    store.execute(&b, Operation::WsWithdraw, &withdraw(2)).unwrap();
    store.commit(a).unwrap();
    store.commit(b).unwrap();

    let check = store.begin().unwrap();
    let payload = store.execute(&check, Operation::WsCheck, &Params::new()).unwrap();
    store.commit(check).unwrap();
    assert_eq!(payload.int_list("violations").unwrap(), &[1]);
}

#[test]
fn wipe_clears_everything() {
    let store = seeded(IsolationMode::Serializable, Operation::AtomicityInit);
    store.wipe().unwrap();
    let tx = store.begin().unwrap();
    let check = store
        .execute(&tx, Operation::AtomicityCheck, &Params::new())
        .unwrap();
    store.commit(tx).unwrap();
    assert_eq!(check.int("numAccounts").unwrap(), 0);
}

proptest! {
    #[test]
    fn committed_increments_survive_aborts(plan in proptest::collection::vec(any::<bool>(), 1..40)) {
        for mode in IsolationMode::ALL {
            let store = seeded(mode, Operation::ImpInit);
            for commit in &plan {
                let tx = store.begin().unwrap();
                store.execute(&tx, Operation::ImpWrite, &account(1)).unwrap();
                if *commit {
                    store.commit(tx).unwrap();
                } else {
                    store.abort(tx).unwrap();
                }
            }
            let committed = plan.iter().filter(|c| **c).count() as i64;
            prop_assert_eq!(read_balance(&store, Operation::ImpRead), 1 + committed, "mode={}", mode);
        }
    }
}
