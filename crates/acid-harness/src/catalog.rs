//! The fixed catalog of isolation-anomaly scenarios.
//!
//! Each [`ScenarioId`] names one fixture (its init operation), one
//! concurrency plan ([`ScenarioPlan`], turned into a task list by
//! [`Scenario::build_tasks`]) and, where the detection rule needs one, a
//! baseline read taken before the tasks run and a final consistency read
//! taken after every task has resolved.

use std::fmt;
use std::time::Duration;

use acid_types::{AccountId, Operation, Params};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::orchestrator::Schedule;
use crate::programs::{Program, WS_WITHDRAW_THRESHOLD};
use crate::task::Task;

/// Every `n`-th AtomicityC transaction reuses an existing account id.
pub const ATOMICITY_COLLISION_STRIDE: usize = 5;

/// Account ids created by the atomicity fixture.
pub const ATOMICITY_FIXTURE_IDS: [AccountId; 2] = [1, 2];

/// Value G1a writers write and then roll back.
pub const G1A_ABORTED_BALANCE: i64 = 200;

/// Values G1b writers set before (even) and after (odd) their pause.
pub const G1B_EVEN: i64 = 200;
pub const G1B_ODD: i64 = 99;

/// Accounts on the OTV/FR transfer cycle.
pub const CYCLE_LEN: i64 = 4;

// ---------------------------------------------------------------------------
// Scenario identity
// ---------------------------------------------------------------------------

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioId {
    #[serde(rename = "AtomicityC")]
    AtomicityC,
    #[serde(rename = "AtomicityRB")]
    AtomicityRb,
    #[serde(rename = "G0")]
    G0,
    #[serde(rename = "G1a")]
    G1a,
    #[serde(rename = "G1b")]
    G1b,
    #[serde(rename = "G1c")]
    G1c,
    #[serde(rename = "IMP")]
    Imp,
    #[serde(rename = "PMP")]
    Pmp,
    #[serde(rename = "OTV")]
    Otv,
    #[serde(rename = "FR")]
    Fr,
    #[serde(rename = "LU")]
    Lu,
    #[serde(rename = "WS")]
    Ws,
}

impl ScenarioId {
    /// Catalog order.
    pub const ALL: [Self; 12] = [
        Self::AtomicityC,
        Self::AtomicityRb,
        Self::G0,
        Self::G1a,
        Self::G1b,
        Self::G1c,
        Self::Imp,
        Self::Pmp,
        Self::Otv,
        Self::Fr,
        Self::Lu,
        Self::Ws,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AtomicityC => "AtomicityC",
            Self::AtomicityRb => "AtomicityRB",
            Self::G0 => "G0",
            Self::G1a => "G1a",
            Self::G1b => "G1b",
            Self::G1c => "G1c",
            Self::Imp => "IMP",
            Self::Pmp => "PMP",
            Self::Otv => "OTV",
            Self::Fr => "FR",
            Self::Lu => "LU",
            Self::Ws => "WS",
        }
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }

    /// The anomaly (or property) the scenario probes.
    #[must_use]
    pub const fn anomaly(self) -> &'static str {
        match self {
            Self::AtomicityC => "atomicity (commit)",
            Self::AtomicityRb => "atomicity (rollback)",
            Self::G0 => "dirty write",
            Self::G1a => "aborted read",
            Self::G1b => "intermediate read",
            Self::G1c => "circular information flow",
            Self::Imp => "item-many-preceders",
            Self::Pmp => "predicate-many-preceders",
            Self::Otv => "observed transaction vanishes",
            Self::Fr => "fractured read",
            Self::Lu => "lost update",
            Self::Ws => "write skew",
        }
    }

    #[must_use]
    pub const fn init_op(self) -> Operation {
        match self {
            Self::AtomicityC | Self::AtomicityRb => Operation::AtomicityInit,
            Self::G0 => Operation::G0Init,
            Self::G1a => Operation::G1aInit,
            Self::G1b => Operation::G1bInit,
            Self::G1c => Operation::G1cInit,
            Self::Imp => Operation::ImpInit,
            Self::Pmp => Operation::PmpInit,
            Self::Otv => Operation::OtvInit,
            Self::Fr => Operation::FrInit,
            Self::Lu => Operation::LuInit,
            Self::Ws => Operation::WsInit,
        }
    }

    #[must_use]
    pub const fn schedule(self) -> Schedule {
        match self {
            Self::AtomicityC | Self::AtomicityRb => Schedule::Sequential,
            _ => Schedule::Concurrent,
        }
    }

    /// Read taken after init and before the tasks run.
    #[must_use]
    pub fn baseline_read(self) -> Option<(Operation, Params)> {
        match self {
            Self::AtomicityC | Self::AtomicityRb => Some((Operation::AtomicityCheck, Params::new())),
            Self::G1a => Some((Operation::G1aRead, Params::new().with("accountId", 1_i64))),
            _ => None,
        }
    }

    /// Read taken after every task has resolved.
    #[must_use]
    pub fn final_read(self) -> Option<(Operation, Params)> {
        match self {
            Self::AtomicityC | Self::AtomicityRb => Some((Operation::AtomicityCheck, Params::new())),
            Self::G0 => Some((
                Operation::G0Check,
                Params::new()
                    .with("account1Id", 1_i64)
                    .with("account2Id", 2_i64),
            )),
            Self::Lu => Some((Operation::LuRead, Params::new().with("accountId", 1_i64))),
            Self::Ws => Some((Operation::WsCheck, Params::new())),
            _ => None,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Counts and timing for one scenario run.
///
/// Fields a scenario does not use are ignored: `rounds` only drives the OTV
/// writer, `pairs` only the WS fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPlan {
    pub writers: usize,
    pub readers: usize,
    pub rounds: usize,
    pub delay_ms: u64,
    pub pairs: usize,
}

impl ScenarioPlan {
    const fn of(writers: usize, readers: usize, delay_ms: u64) -> Self {
        Self {
            writers,
            readers,
            rounds: 0,
            delay_ms,
            pairs: 0,
        }
    }

    /// The standard plan for a scenario.
    #[must_use]
    pub const fn default_for(id: ScenarioId) -> Self {
        match id {
            ScenarioId::AtomicityC | ScenarioId::AtomicityRb => Self::of(50, 0, 0),
            ScenarioId::G0 => Self::of(200, 0, 0),
            ScenarioId::G1a => Self::of(5, 5, 250),
            ScenarioId::G1b => Self::of(20, 20, 1),
            ScenarioId::G1c => Self::of(100, 0, 0),
            ScenarioId::Imp | ScenarioId::Pmp => Self::of(20, 20, 250),
            ScenarioId::Otv => Self {
                rounds: 100,
                ..Self::of(1, 50, 250)
            },
            ScenarioId::Fr => Self::of(100, 100, 250),
            ScenarioId::Lu => Self::of(200, 0, 0),
            ScenarioId::Ws => Self {
                pairs: 10,
                ..Self::of(50, 0, 250)
            },
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A scenario bound to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub id: ScenarioId,
    pub plan: ScenarioPlan,
}

/// Writer `i` first, then reader `i`, then whatever remains of either list.
fn interleave(writers: Vec<Task>, readers: Vec<Task>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(writers.len() + readers.len());
    let mut writers = writers.into_iter();
    let mut readers = readers.into_iter();
    loop {
        match (writers.next(), readers.next()) {
            (None, None) => return tasks,
            (w, r) => tasks.extend(w.into_iter().chain(r)),
        }
    }
}

fn ids(pairs: &[(&str, i64)]) -> Params {
    pairs
        .iter()
        .fold(Params::new(), |params, (name, value)| params.with(name, *value))
}

/// Whether an atomicity task targets an account id the fixture already
/// holds.
#[must_use]
pub fn is_collision(task: &Task) -> bool {
    task.params
        .int("account2Id")
        .is_ok_and(|id| ATOMICITY_FIXTURE_IDS.contains(&id))
}

impl Scenario {
    #[must_use]
    pub const fn standard(id: ScenarioId) -> Self {
        Self {
            id,
            plan: ScenarioPlan::default_for(id),
        }
    }

    /// Parameters for the init operation.
    #[must_use]
    pub fn init_params(&self) -> Params {
        match self.id {
            ScenarioId::Ws => Params::new().with("numPairs", self.plan.pairs as i64),
            _ => Params::new(),
        }
    }

    /// Build the full task list. All random choices come from `rng`.
    pub fn build_tasks(&self, rng: &mut StdRng) -> Vec<Task> {
        let plan = &self.plan;
        let delay = plan.delay();
        let writers = plan.writers as i64;
        let readers = plan.readers as i64;
        match self.id {
            ScenarioId::AtomicityC => (0..plan.writers)
                .map(|i| {
                    let account2 = if (i + 1) % ATOMICITY_COLLISION_STRIDE == 0 {
                        ATOMICITY_FIXTURE_IDS[1]
                    } else {
                        3 + i as i64
                    };
                    Task::writer(
                        Program::AtomicityC,
                        ids(&[
                            ("account1Id", 1),
                            ("account2Id", account2),
                            ("newTrans", 200 + i as i64),
                        ]),
                    )
                })
                .collect(),
            ScenarioId::AtomicityRb => (0..writers)
                .map(|i| {
                    let account2 = if i % 2 == 0 { ATOMICITY_FIXTURE_IDS[1] } else { 3 + i };
                    Task::writer(
                        Program::AtomicityRb,
                        ids(&[("account1Id", 1), ("account2Id", account2), ("newTrans", 200)]),
                    )
                })
                .collect(),
            ScenarioId::G0 => (1..=writers)
                .map(|txn| {
                    Task::writer(
                        Program::G0,
                        ids(&[("account1Id", 1), ("account2Id", 2), ("transactionId", txn)]),
                    )
                })
                .collect(),
            ScenarioId::G1a => {
                let write = ids(&[("accountId", 1), ("balance", G1A_ABORTED_BALANCE)]);
                let read = ids(&[("accountId", 1)]);
                (0..plan.writers)
                    .map(|_| Task::writer(Program::G1aWriter, write.clone()).with_delay(delay))
                    .chain((0..plan.readers).map(|_| Task::reader(Program::G1aReader, read.clone())))
                    .collect()
            }
            ScenarioId::G1b => {
                let write = ids(&[("accountId", 1), ("even", G1B_EVEN), ("odd", G1B_ODD)]);
                let read = ids(&[("accountId", 1)]);
                (0..plan.writers)
                    .map(|_| Task::writer(Program::G1bWriter, write.clone()).with_delay(delay))
                    .chain((0..plan.readers).map(|_| Task::reader(Program::G1bReader, read.clone())))
                    .collect()
            }
            ScenarioId::G1c => (1..=writers)
                .map(|txn| {
                    let (a1, a2) = if rng.gen_bool(0.5) { (1, 2) } else { (2, 1) };
                    Task::writer(
                        Program::G1c,
                        ids(&[("account1Id", a1), ("account2Id", a2), ("transactionId", txn)]),
                    )
                })
                .collect(),
            ScenarioId::Imp => interleave(
                (0..plan.writers)
                    .map(|_| Task::writer(Program::ImpWriter, ids(&[("accountId", 1)])))
                    .collect(),
                (0..plan.readers)
                    .map(|_| Task::reader(Program::ImpReader, ids(&[("accountId", 1)])).with_delay(delay))
                    .collect(),
            ),
            ScenarioId::Pmp => interleave(
                (0..plan.writers)
                    .map(|_| Task::writer(Program::PmpWriter, ids(&[("account1Id", 1), ("account2Id", 2)])))
                    .collect(),
                (0..plan.readers)
                    .map(|_| Task::reader(Program::PmpReader, ids(&[("accountId", 2)])).with_delay(delay))
                    .collect(),
            ),
            ScenarioId::Otv => {
                let mut tasks: Vec<Task> = (0..plan.writers)
                    .map(|_| {
                        let starts: Vec<i64> =
                            (0..plan.rounds).map(|_| rng.gen_range(1..=CYCLE_LEN)).collect();
                        Task::writer(Program::OtvWriter, Params::new().with("startAccountIds", starts))
                    })
                    .collect();
                tasks.extend((0..readers).map(|_| {
                    let start = rng.gen_range(1..=CYCLE_LEN);
                    Task::reader(Program::OtvReader, ids(&[("accountId", start)])).with_delay(delay)
                }));
                tasks
            }
            ScenarioId::Fr => interleave(
                (0..plan.writers)
                    .map(|_| Task::writer(Program::FrWriter, ids(&[("accountId", 1)])))
                    .collect(),
                (0..plan.readers)
                    .map(|_| Task::reader(Program::FrReader, ids(&[("accountId", 1)])).with_delay(delay))
                    .collect(),
            ),
            ScenarioId::Lu => (0..writers)
                .map(|i| Task::writer(Program::LuWriter, ids(&[("account1Id", 1), ("account2Id", i + 2)])))
                .collect(),
            ScenarioId::Ws => {
                let pairs = (plan.pairs as i64).max(1);
                (0..plan.writers)
                    .map(|_| {
                        let pair = rng.gen_range(1..=pairs);
                        let (a1, a2) = (2 * pair - 1, 2 * pair);
                        let side = if rng.gen_bool(0.5) { a1 } else { a2 };
                        Task::writer(
                            Program::WsWriter,
                            ids(&[
                                ("account1Id", a1),
                                ("account2Id", a2),
                                ("withdrawFrom", side),
                                ("amount", WS_WITHDRAW_THRESHOLD),
                            ]),
                        )
                        .with_delay(delay)
                    })
                    .collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// An ordered set of scenarios to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl Default for ScenarioCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScenarioCatalog {
    /// All twelve scenarios with their standard plans.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(ScenarioId::ALL.into_iter().map(Scenario::standard).collect())
    }

    #[must_use]
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    #[must_use]
    pub fn get(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
