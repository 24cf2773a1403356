//! Transaction programs: the bodies of every scenario's writer and reader
//! templates.
//!
//! A program opens one or more transactions through a [`TaskContext`],
//! issues named operations, and takes its race-widening pause *inside* the
//! open transaction. Any error returned here becomes an aborted outcome in
//! the orchestrator; the [`Txn`](crate::task::Txn) guard makes sure the
//! transaction is rolled back first.

use std::time::Duration;

use acid_error::{AbortKind, AcidError, Result};
use acid_types::{AbortCause, Operation, Params, Payload, TransactionOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::TaskContext;

/// Balance sum a write-skew writer requires before withdrawing.
pub const WS_WITHDRAW_THRESHOLD: i64 = 100;

/// A transaction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    AtomicityC,
    AtomicityRb,
    G0,
    G1aWriter,
    G1aReader,
    G1bWriter,
    G1bReader,
    G1c,
    ImpWriter,
    ImpReader,
    PmpWriter,
    PmpReader,
    /// Runs one transaction per entry of `startAccountIds`.
    OtvWriter,
    OtvReader,
    FrWriter,
    FrReader,
    LuWriter,
    WsWriter,
}

fn committed(payload: Payload) -> TransactionOutcome {
    TransactionOutcome::Committed(payload)
}

/// Read `field` of `op` twice with a pause in between, in one transaction.
fn read_twice(
    ctx: &TaskContext<'_>,
    op: Operation,
    field: &str,
    params: &Params,
    delay: Duration,
) -> Result<TransactionOutcome> {
    let tx = ctx.begin()?;
    let first = tx.execute(op, params)?;
    ctx.pause(delay);
    let second = tx.execute(op, params)?;
    tx.commit()?;

    let mut payload = Payload::new();
    for (name, source) in [("firstRead", first), ("secondRead", second)] {
        let value = source
            .get(field)
            .cloned()
            .ok_or_else(|| AcidError::missing(field))?;
        payload.insert(name, value);
    }
    Ok(committed(payload))
}

/// Run a single operation and commit.
fn single(ctx: &TaskContext<'_>, op: Operation, params: &Params) -> Result<TransactionOutcome> {
    let tx = ctx.begin()?;
    let payload = tx.execute(op, params)?;
    tx.commit()?;
    Ok(committed(payload))
}

impl Program {
    /// Operation family name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtomicityC => "atomicityC",
            Self::AtomicityRb => "atomicityRB",
            Self::G0 => "g0",
            Self::G1aWriter => "g1aW",
            Self::G1aReader => "g1aR",
            Self::G1bWriter => "g1bW",
            Self::G1bReader => "g1bR",
            Self::G1c => "g1c",
            Self::ImpWriter => "impW",
            Self::ImpReader => "impR",
            Self::PmpWriter => "pmpW",
            Self::PmpReader => "pmpR",
            Self::OtvWriter => "otvW",
            Self::OtvReader => "otvR",
            Self::FrWriter => "frW",
            Self::FrReader => "frR",
            Self::LuWriter => "luW",
            Self::WsWriter => "wsW",
        }
    }

    /// Execute the program against the store behind `ctx`.
    pub fn run(
        self,
        ctx: &TaskContext<'_>,
        params: &Params,
        delay: Duration,
    ) -> Result<TransactionOutcome> {
        match self {
            Self::AtomicityC => single(ctx, Operation::AtomicityC, params),
            Self::AtomicityRb => {
                let tx = ctx.begin()?;
                tx.execute(Operation::AtomicityRbAppend, params)?;
                let probe = tx.execute(Operation::AtomicityRbProbe, params)?;
                if probe.int("numMatches")? > 0 {
                    tx.abort()?;
                    return Ok(TransactionOutcome::Aborted(AbortCause::Requested));
                }
                tx.execute(Operation::AtomicityRbCreate, params)?;
                tx.commit()?;
                Ok(committed(Payload::new()))
            }
            Self::G0 => single(ctx, Operation::G0, params),
            Self::G1aWriter => {
                let tx = ctx.begin()?;
                let located = tx.execute(Operation::G1aLocate, params)?;
                ctx.pause(delay);
                let write = Params::new()
                    .with("internalId", located.int("internalId")?)
                    .with("balance", params.int("balance")?);
                tx.execute(Operation::G1aWrite, &write)?;
                ctx.pause(delay);
                tx.abort()?;
                Ok(TransactionOutcome::Aborted(AbortCause::Requested))
            }
            Self::G1aReader => single(ctx, Operation::G1aRead, params),
            Self::G1bWriter => {
                let account = params.int("accountId")?;
                let tx = ctx.begin()?;
                let even = Params::new()
                    .with("accountId", account)
                    .with("balance", params.int("even")?);
                tx.execute(Operation::G1bWrite, &even)?;
                ctx.pause(delay);
                let odd = Params::new()
                    .with("accountId", account)
                    .with("balance", params.int("odd")?);
                tx.execute(Operation::G1bWrite, &odd)?;
                tx.commit()?;
                Ok(committed(Payload::new()))
            }
            Self::G1bReader => single(ctx, Operation::G1bRead, params),
            Self::G1c => single(ctx, Operation::G1c, params),
            Self::ImpWriter => single(ctx, Operation::ImpWrite, params),
            Self::ImpReader => read_twice(ctx, Operation::ImpRead, "balance", params, delay),
            Self::PmpWriter => single(ctx, Operation::PmpWrite, params),
            Self::PmpReader => read_twice(ctx, Operation::PmpRead, "numTransfers", params, delay),
            Self::OtvWriter => {
                let mut rounds_committed = 0_i64;
                let mut rounds_aborted = 0_i64;
                let mut last_error = None;
                for start in params.int_list("startAccountIds")? {
                    let round = Params::new().with("accountId", *start);
                    match single(ctx, Operation::OtvWrite, &round) {
                        Ok(_) => rounds_committed += 1,
                        Err(err) if err.abort_kind() == AbortKind::MissingFixture => return Err(err),
                        Err(err) => {
                            rounds_aborted += 1;
                            debug!(start = *start, error = %err, "otv writer round aborted");
                            last_error = Some(err);
                        }
                    }
                }
                // A writer with no committed round took no part in the race.
                if let (0, Some(err)) = (rounds_committed, last_error) {
                    return Err(err);
                }
                Ok(committed(
                    Payload::new()
                        .with("roundsCommitted", rounds_committed)
                        .with("roundsAborted", rounds_aborted),
                ))
            }
            Self::OtvReader => read_twice(ctx, Operation::OtvRead, "balances", params, delay),
            Self::FrWriter => single(ctx, Operation::FrWrite, params),
            Self::FrReader => read_twice(ctx, Operation::FrRead, "balances", params, delay),
            Self::LuWriter => single(ctx, Operation::LuWrite, params),
            Self::WsWriter => {
                let tx = ctx.begin()?;
                let balances = tx.execute(Operation::WsRead, params)?;
                let sum = balances.int("a1Balance")? + balances.int("a2Balance")?;
                if sum < WS_WITHDRAW_THRESHOLD {
                    tx.commit()?;
                    return Ok(committed(Payload::new().with("withdrawn", 0_i64)));
                }
                ctx.pause(delay);
                let withdraw = Params::new()
                    .with("accountId", params.int("withdrawFrom")?)
                    .with("amount", params.int("amount")?);
                tx.execute(Operation::WsWithdraw, &withdraw)?;
                tx.commit()?;
                Ok(committed(Payload::new().with("withdrawn", 1_i64)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use acid_memstore::{IsolationMode, MemoryStore};
    use acid_types::TransactionalStore;

    use super::*;
    use crate::task::{Txn, VirtualClock};

    fn store_with(init: Operation) -> MemoryStore {
        let store = MemoryStore::new(IsolationMode::Serializable);
        let tx = Txn::begin(&store).unwrap();
        tx.execute(init, &Params::new()).unwrap();
        tx.commit().unwrap();
        store
    }

    fn run(store: &MemoryStore, program: Program, params: &Params) -> (TransactionOutcome, usize) {
        let clock = VirtualClock::new();
        let ctx = TaskContext::new(store, &clock);
        let outcome = program
            .run(&ctx, params, Duration::from_millis(250))
            .unwrap();
        (outcome, clock.pauses())
    }

    #[test]
    fn g1a_writer_rolls_back() {
        let store = store_with(Operation::G1aInit);
        let params = Params::new().with("accountId", 1_i64).with("balance", 200_i64);
        let (outcome, pauses) = run(&store, Program::G1aWriter, &params);
        assert_eq!(outcome, TransactionOutcome::Aborted(AbortCause::Requested));
        assert_eq!(pauses, 2);

        let (outcome, _) = run(&store, Program::G1aReader, &Params::new().with("accountId", 1_i64));
        assert_eq!(outcome.payload().unwrap().int("aBalance").unwrap(), 99);
    }

    #[test]
    fn atomicity_rb_aborts_on_existing_account() {
        let store = store_with(Operation::AtomicityInit);
        let colliding = Params::new()
            .with("account1Id", 1_i64)
            .with("account2Id", 2_i64)
            .with("newTrans", 200_i64);
        let (outcome, _) = run(&store, Program::AtomicityRb, &colliding);
        assert_eq!(outcome, TransactionOutcome::Aborted(AbortCause::Requested));

        let fresh = Params::new()
            .with("account1Id", 1_i64)
            .with("account2Id", 4_i64)
            .with("newTrans", 200_i64);
        let (outcome, _) = run(&store, Program::AtomicityRb, &fresh);
        assert!(outcome.is_committed());

        let tx = Txn::begin(&store).unwrap();
        let check = tx.execute(Operation::AtomicityCheck, &Params::new()).unwrap();
        tx.commit().unwrap();
        assert_eq!(check.int("numAccounts").unwrap(), 3);
        assert_eq!(check.int("numTransferred").unwrap(), 4);
    }

    #[test]
    fn readers_report_both_reads() {
        let store = store_with(Operation::OtvInit);
        let (outcome, pauses) = run(&store, Program::OtvReader, &Params::new().with("accountId", 3_i64));
        let payload = outcome.payload().unwrap();
        assert_eq!(payload.int_list("firstRead").unwrap(), &[0, 0, 0, 0]);
        assert_eq!(payload.int_list("secondRead").unwrap(), &[0, 0, 0, 0]);
        assert_eq!(pauses, 1);
    }

    #[test]
    fn otv_writer_runs_every_round() {
        let store = store_with(Operation::OtvInit);
        let params = Params::new().with("startAccountIds", vec![1_i64, 2, 3, 4, 1]);
        let (outcome, _) = run(&store, Program::OtvWriter, &params);
        let payload = outcome.payload().unwrap();
        assert_eq!(payload.int("roundsCommitted").unwrap(), 5);
        assert_eq!(payload.int("roundsAborted").unwrap(), 0);

        let (outcome, _) = run(&store, Program::FrReader, &Params::new().with("accountId", 1_i64));
        assert_eq!(
            outcome.payload().unwrap().int_list("firstRead").unwrap(),
            &[5, 5, 5, 5]
        );
    }

    #[test]
    fn otv_writer_without_fixture_is_missing_fixture() {
        let store = MemoryStore::new(IsolationMode::Serializable);
        let clock = VirtualClock::new();
        let ctx = TaskContext::new(&store, &clock);
        let params = Params::new().with("startAccountIds", vec![1_i64, 2]);
        let err = Program::OtvWriter
            .run(&ctx, &params, Duration::ZERO)
            .unwrap_err();
        assert_eq!(err.abort_kind(), AbortKind::MissingFixture, "got={err}");
    }

    #[test]
    fn ws_writer_respects_threshold() {
        let store = store_with(Operation::WsInit);
        let params = Params::new()
            .with("account1Id", 1_i64)
            .with("account2Id", 2_i64)
            .with("withdrawFrom", 1_i64)
            .with("amount", 100_i64);
        let (outcome, pauses) = run(&store, Program::WsWriter, &params);
        assert_eq!(outcome.payload().unwrap().int("withdrawn").unwrap(), 1);
        assert_eq!(pauses, 1);

        // 150 - 100 = 50 left: below the threshold, nothing withdrawn.
        let (outcome, pauses) = run(&store, Program::WsWriter, &params);
        assert_eq!(outcome.payload().unwrap().int("withdrawn").unwrap(), 0);
        assert_eq!(pauses, 0);
        assert_eq!(store.stats().aborts, 0);
        assert_eq!(store.name(), "memory-serializable");
    }

    #[test]
    fn missing_fixture_surfaces_as_error() {
        let store = MemoryStore::new(IsolationMode::Serializable);
        let clock = VirtualClock::new();
        let ctx = TaskContext::new(&store, &clock);
        let err = Program::ImpReader
            .run(&ctx, &Params::new().with("accountId", 1_i64), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, AcidError::EmptyResult { .. }), "got={err}");
        assert_eq!(store.open_transactions(), 0);
    }
}
