//! Isolation-anomaly verification harness.
//!
//! ```text
//!  Harness::run()
//!    └── for each Scenario in the ScenarioCatalog
//!          ├── wipe → init → baseline read
//!          ├── Orchestrator::run(tasks)  ── worker pool ──▶ TransactionalStore
//!          ├── final consistency read
//!          └── judge() → ScenarioReport
//! ```
//!
//! The harness is store-agnostic: it only calls the four operations of
//! [`acid_types::TransactionalStore`] plus `wipe`.

use std::time::Duration;

pub mod catalog;
pub mod config;
pub mod harness;
pub mod judge;
pub mod logging;
pub mod orchestrator;
pub mod programs;
pub mod report;
pub mod task;

pub use catalog::{Scenario, ScenarioCatalog, ScenarioId, ScenarioPlan};
pub use config::{HarnessConfig, PlanOverrides};
pub use harness::Harness;
pub use judge::{Evidence, Judgement, Verdict, judge};
pub use orchestrator::{OrchestratedRun, Orchestrator, Schedule};
pub use programs::Program;
pub use report::{HarnessReport, ScenarioReport};
pub use task::{Role, Sleeper, Task, TaskContext, Txn, VirtualClock, WallClock};

/// Worker threads in the orchestrator pool.
pub const DEFAULT_POOL_SIZE: usize = 8;

/// Overall wait for the pool to drain before a scenario is given up.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(3600);

/// Pause taken before and after every wipe.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Default base seed for task-parameter generation.
pub const DEFAULT_SEED: u64 = 0x4143_4944;

/// Derive an independent RNG seed for one scenario from the run seed.
#[inline]
#[must_use]
pub const fn derive_scenario_seed(base_seed: u64, scenario_ordinal: u64) -> u64 {
    base_seed ^ scenario_ordinal.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
