//! Drives every selected scenario against one store.
//!
//! Per scenario: settle, wipe, settle, init, baseline read, orchestrate the
//! task list, final read, judge. A failure before judging marks only that
//! scenario as `SetupFailed`; the run moves on to the next one. The exception
//! is a drain timeout: its tasks may still be running against the store, so
//! every later scenario is marked `SetupFailed` without touching the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use acid_error::{AcidError, Result};
use acid_types::{Operation, Params, Payload, TransactionalStore};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, info_span, warn};

use crate::catalog::{Scenario, ScenarioCatalog, ScenarioId};
use crate::config::HarnessConfig;
use crate::derive_scenario_seed;
use crate::judge::{Evidence, Verdict, judge};
use crate::orchestrator::{OrchestratedRun, Orchestrator};
use crate::report::{HarnessReport, ScenarioReport};
use crate::task::{Sleeper, Task, Txn, WallClock};

/// Scenario runner bound to one store.
pub struct Harness {
    store: Arc<dyn TransactionalStore>,
    catalog: ScenarioCatalog,
    orchestrator: Orchestrator,
    sleeper: Arc<dyn Sleeper>,
    settle_delay: Duration,
    seed: u64,
    /// Set once a scenario's pool timed out with tasks still running.
    stranded: Mutex<Option<String>>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("store", &self.store.name())
            .field("scenarios", &self.catalog.len())
            .field("orchestrator", &self.orchestrator)
            .field("settle_delay", &self.settle_delay)
            .field("seed", &self.seed)
            .field("stranded", &*self.stranded.lock())
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// # Errors
    ///
    /// Returns `AcidError::Config` if `config` does not validate.
    pub fn new(store: Arc<dyn TransactionalStore>, config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            catalog: config.catalog()?,
            orchestrator: Orchestrator::new(config.pool_size)
                .with_drain_timeout(config.drain_timeout()),
            sleeper: Arc::new(WallClock),
            settle_delay: config.settle_delay(),
            seed: config.seed,
            stranded: Mutex::new(None),
        })
    }

    /// Route settle pauses and in-transaction delays through `sleeper`.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.orchestrator = self.orchestrator.with_sleeper(Arc::clone(&sleeper));
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ScenarioCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub const fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn TransactionalStore> {
        &self.store
    }

    /// Run every scenario in catalog order.
    #[must_use]
    pub fn run(&self) -> HarnessReport {
        let started = Instant::now();
        let mut report = HarnessReport::new(self.store.name(), self.seed, self.orchestrator.pool_size());
        info!(
            store = self.store.name(),
            scenarios = self.catalog.len(),
            seed = self.seed,
            "harness run starting"
        );
        for scenario in self.catalog.iter() {
            report.scenarios.push(self.run_scenario(scenario));
        }
        report.elapsed_ms = millis(started.elapsed());
        if report.passed() {
            info!(store = self.store.name(), elapsed_ms = report.elapsed_ms, "{}", report.triage_line());
        } else {
            warn!(store = self.store.name(), elapsed_ms = report.elapsed_ms, "{}", report.triage_line());
        }
        report
    }

    /// Run one scenario with tasks generated from its plan.
    #[must_use]
    pub fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let mut rng = StdRng::seed_from_u64(derive_scenario_seed(self.seed, scenario.id as u64));
        let tasks = scenario.build_tasks(&mut rng);
        self.run_with_tasks(scenario, tasks)
    }

    /// Run one scenario's fixture and judgement around an explicit task
    /// list.
    #[must_use]
    pub fn run_with_tasks(&self, scenario: &Scenario, tasks: Vec<Task>) -> ScenarioReport {
        let id = scenario.id;
        let span = info_span!("scenario", scenario = id.name(), store = self.store.name());
        let _entered = span.enter();
        let started = Instant::now();

        let stranded = self.stranded.lock().clone();
        if let Some(detail) = stranded {
            let err = AcidError::setup(id.name(), "start", detail);
            warn!(error = %err, "scenario skipped");
            return ScenarioReport::setup_failed(id, &err, 0);
        }

        let (run, evidence) = match self.execute(scenario, tasks) {
            Ok(collected) => collected,
            Err(err) => {
                warn!(error = %err, "scenario setup failed");
                return ScenarioReport::setup_failed(id, &err, millis(started.elapsed()));
            }
        };

        let judgement = judge(id, &run, &evidence);
        match judgement.verdict {
            Verdict::Passed => info!(
                submitted = judgement.submitted,
                aborted = judgement.aborted,
                verdict = %judgement.verdict,
                "scenario complete"
            ),
            Verdict::AnomalyDetected => {
                for note in &judgement.notes {
                    let violation = AcidError::InvariantViolation {
                        scenario: id.name().to_owned(),
                        detail: note.clone(),
                    };
                    error!(anomaly = id.anomaly(), "{violation}");
                }
                error!(
                    submitted = judgement.submitted,
                    aborted = judgement.aborted,
                    anomalies = judgement.anomalies,
                    verdict = %judgement.verdict,
                    "anomaly detected"
                );
            }
            Verdict::Inconclusive | Verdict::SetupFailed => warn!(
                submitted = judgement.submitted,
                aborted = judgement.aborted,
                verdict = %judgement.verdict,
                notes = ?judgement.notes,
                "scenario produced no usable evidence"
            ),
        }
        ScenarioReport::from_judgement(id, judgement, millis(started.elapsed()))
    }

    fn execute(&self, scenario: &Scenario, tasks: Vec<Task>) -> Result<(OrchestratedRun, Evidence)> {
        let id = scenario.id;

        self.settle();
        self.store.wipe().map_err(|e| stage_failure(id, "wipe", &e))?;
        self.settle();

        self.single(id.init_op(), &scenario.init_params())
            .map_err(|e| stage_failure(id, "init", &e))?;
        let baseline = id
            .baseline_read()
            .map(|(op, params)| self.single(op, &params))
            .transpose()
            .map_err(|e| stage_failure(id, "baseline read", &e))?;

        let run = self
            .orchestrator
            .run(&self.store, tasks, id.schedule())
            .map_err(|e| {
                if matches!(e, AcidError::DrainTimeout { .. }) {
                    *self.stranded.lock() =
                        Some(format!("tasks of {} may still be running against the store", id.name()));
                }
                stage_failure(id, "orchestrate", &e)
            })?;

        let final_read = id
            .final_read()
            .map(|(op, params)| self.single(op, &params))
            .transpose()
            .map_err(|e| stage_failure(id, "final read", &e))?;

        Ok((
            run,
            Evidence {
                baseline,
                final_read,
            },
        ))
    }

    /// One operation in its own committed transaction.
    fn single(&self, op: Operation, params: &Params) -> Result<Payload> {
        let txn = Txn::begin(self.store.as_ref())?;
        let payload = txn.execute(op, params)?;
        txn.commit()?;
        Ok(payload)
    }

    fn settle(&self) {
        if !self.settle_delay.is_zero() {
            self.sleeper.pause(self.settle_delay);
        }
    }
}

fn stage_failure(id: ScenarioId, stage: &str, err: &AcidError) -> AcidError {
    AcidError::setup(id.name(), stage, err.to_string())
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
