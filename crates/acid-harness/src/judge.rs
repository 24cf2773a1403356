//! Turns collected outcomes into a per-scenario verdict.
//!
//! The judge is pure: it sees the orchestrated run (tasks and outcomes,
//! index-aligned) plus the baseline and final consistency reads, and counts
//! anomalies according to each scenario's detection rule.

use std::collections::{HashMap, HashSet};
use std::fmt;

use acid_error::{AcidError, Result};
use acid_types::{Payload, TransactionOutcome};
use serde::{Deserialize, Serialize};

use crate::catalog::{ScenarioId, is_collision};
use crate::orchestrator::OrchestratedRun;
use crate::task::Role;

/// Notes kept per judgement; the rest are summarized.
const MAX_NOTES: usize = 20;

/// Scenario verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    /// The detection rule fired: the store exhibited the anomaly.
    AnomalyDetected,
    /// Every task aborted, so the race never ran.
    Inconclusive,
    /// Wipe, init, fixture reads or the pool drain failed.
    SetupFailed,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::AnomalyDetected => "ANOMALY",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::SetupFailed => "SETUP-FAILED",
        }
    }

    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads taken around the orchestrated run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evidence {
    pub baseline: Option<Payload>,
    pub final_read: Option<Payload>,
}

/// Counts and verdict for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub submitted: usize,
    pub aborted: usize,
    pub adapter_errors: usize,
    pub anomalies: usize,
    pub verdict: Verdict,
    pub notes: Vec<String>,
}

impl Judgement {
    fn push_notes(&mut self, notes: Vec<String>) {
        let total = notes.len();
        self.notes.extend(notes.into_iter().take(MAX_NOTES));
        if total > MAX_NOTES {
            self.notes.push(format!("... and {} more", total - MAX_NOTES));
        }
    }
}

/// Judge one scenario run.
#[must_use]
pub fn judge(id: ScenarioId, run: &OrchestratedRun, evidence: &Evidence) -> Judgement {
    let mut judgement = Judgement {
        submitted: run.submitted(),
        aborted: run.aborted(),
        adapter_errors: run.adapter_failures(),
        anomalies: 0,
        verdict: Verdict::Passed,
        notes: Vec::new(),
    };

    let missing = run.missing_fixtures();
    if missing > 0 {
        judgement.verdict = Verdict::SetupFailed;
        judgement.notes.push(format!("{missing} tasks found no fixture rows"));
        return judgement;
    }

    match detect(id, run, evidence) {
        Ok(anomalies) => {
            judgement.anomalies = anomalies.len();
            judgement.push_notes(anomalies);
        }
        Err(err) => {
            judgement.verdict = Verdict::SetupFailed;
            judgement.notes.push(format!("unusable results: {err}"));
            return judgement;
        }
    }

    judgement.verdict = if judgement.anomalies > 0 {
        Verdict::AnomalyDetected
    } else if judgement.submitted >= 2 && judgement.aborted == judgement.submitted {
        judgement
            .notes
            .push(format!("all {} tasks aborted", judgement.submitted));
        Verdict::Inconclusive
    } else {
        Verdict::Passed
    };
    judgement
}

fn detect(id: ScenarioId, run: &OrchestratedRun, evidence: &Evidence) -> Result<Vec<String>> {
    match id {
        ScenarioId::AtomicityC | ScenarioId::AtomicityRb => atomicity(run, evidence),
        ScenarioId::G0 => dirty_write(run, required(evidence.final_read.as_ref(), "g0Check")?),
        ScenarioId::G1a => aborted_read(run, required(evidence.baseline.as_ref(), "g1aRead baseline")?),
        ScenarioId::G1b => intermediate_read(run),
        ScenarioId::G1c => circular_flow(run),
        ScenarioId::Imp | ScenarioId::Pmp | ScenarioId::Fr => repeatable_reads(run),
        ScenarioId::Otv => monotonic_reads(run),
        ScenarioId::Lu => lost_update(run, required(evidence.final_read.as_ref(), "luRead")?),
        ScenarioId::Ws => write_skew(required(evidence.final_read.as_ref(), "wsCheck")?),
    }
}

fn required<'a>(payload: Option<&'a Payload>, what: &str) -> Result<&'a Payload> {
    payload.ok_or_else(|| AcidError::missing(what))
}

/// Committed reader payloads with their task index.
fn committed_readers(run: &OrchestratedRun) -> impl Iterator<Item = (usize, &Payload)> {
    run.by_role(Role::Reader)
        .filter_map(|(index, _, outcome)| outcome.payload().map(|p| (index, p)))
}

// ---------------------------------------------------------------------------
// Detection rules
// ---------------------------------------------------------------------------

fn atomicity(run: &OrchestratedRun, evidence: &Evidence) -> Result<Vec<String>> {
    let baseline = required(evidence.baseline.as_ref(), "atomicityCheck baseline")?;
    let after = required(evidence.final_read.as_ref(), "atomicityCheck")?;
    let committed = run.committed() as i64;

    let mut notes = Vec::new();
    for (field, per_commit) in [("numAccounts", 1), ("numNames", 0), ("numTransferred", 1)] {
        let expected = baseline.int(field)? + per_commit * committed;
        let actual = after.int(field)?;
        if actual != expected {
            notes.push(format!(
                "{field} is {actual}, expected {expected} after {committed} commits"
            ));
        }
    }
    for (index, task, outcome) in run.iter() {
        if is_collision(task) && outcome.is_committed() {
            notes.push(format!(
                "task {index} committed with existing account id {}",
                task.params.int("account2Id")?
            ));
        }
    }
    Ok(notes)
}

fn dirty_write(run: &OrchestratedRun, check: &Payload) -> Result<Vec<String>> {
    let histories = [
        ("account1", check.int_list("a1VersionHistory")?),
        ("transfer", check.int_list("tVersionHistory")?),
        ("account2", check.int_list("a2VersionHistory")?),
    ];
    let sets: Vec<HashSet<i64>> = histories
        .iter()
        .map(|(_, list)| list.iter().copied().collect())
        .collect();
    let common = |list: &[i64]| -> Vec<i64> {
        list.iter()
            .copied()
            .filter(|v| sets.iter().all(|s| s.contains(v)))
            .collect()
    };

    let mut notes = Vec::new();
    let reference = common(histories[0].1);
    for (name, list) in &histories[1..] {
        let restricted = common(*list);
        if restricted != reference {
            notes.push(format!(
                "{name} versionHistory order differs from account1: {restricted:?} vs {reference:?}"
            ));
        }
    }

    for (_, task, outcome) in run.iter() {
        let txn = task.params.int("transactionId")?;
        for ((name, _), set) in histories.iter().zip(&sets) {
            match outcome {
                TransactionOutcome::Committed(_) if !set.contains(&txn) => {
                    notes.push(format!("committed transaction {txn} missing from {name}"));
                }
                TransactionOutcome::Aborted(_) if set.contains(&txn) => {
                    notes.push(format!("aborted transaction {txn} visible on {name}"));
                }
                _ => {}
            }
        }
    }
    Ok(notes)
}

/// Every G1a writer rolls back, so readers must only ever see the baseline.
fn aborted_read(run: &OrchestratedRun, baseline: &Payload) -> Result<Vec<String>> {
    let expected = baseline.int("aBalance")?;
    let mut aborted_values = HashSet::new();
    for (_, task, outcome) in run.by_role(Role::Writer) {
        if outcome.is_aborted() {
            aborted_values.insert(task.params.int("balance")?);
        }
    }
    let mut notes = Vec::new();
    for (index, payload) in committed_readers(run) {
        let observed = payload.int("aBalance")?;
        if aborted_values.contains(&observed) {
            notes.push(format!("reader {index} observed aborted write {observed}"));
        } else if observed != expected {
            notes.push(format!(
                "reader {index} observed {observed}, baseline was {expected}"
            ));
        }
    }
    Ok(notes)
}

fn intermediate_read(run: &OrchestratedRun) -> Result<Vec<String>> {
    let mut notes = Vec::new();
    for (index, payload) in committed_readers(run) {
        let observed = payload.int("aBalance")?;
        if observed.rem_euclid(2) == 0 {
            notes.push(format!("reader {index} observed intermediate value {observed}"));
        }
    }
    Ok(notes)
}

fn circular_flow(run: &OrchestratedRun) -> Result<Vec<String>> {
    let mut by_txn = HashMap::new();
    for (index, task, _) in run.iter() {
        by_txn.insert(task.params.int("transactionId")?, index);
    }

    let mut notes = Vec::new();
    for (_, task, outcome) in run.iter() {
        let Some(payload) = outcome.payload() else {
            continue;
        };
        let txn = task.params.int("transactionId")?;
        let observed = payload.int("account2Balance")?;
        if observed == 0 {
            continue;
        }
        let Some(source) = by_txn.get(&observed).and_then(|i| run.outcome(*i)) else {
            notes.push(format!("transaction {txn} read {observed}, which no transaction wrote"));
            continue;
        };
        match source.payload() {
            None => notes.push(format!(
                "transaction {txn} read data written by aborted transaction {observed}"
            )),
            Some(source_payload) if source_payload.int("account2Balance")? == txn => {
                notes.push(format!(
                    "circular information flow between transactions {txn} and {observed}"
                ));
            }
            Some(_) => {}
        }
    }
    Ok(notes)
}

fn repeatable_reads(run: &OrchestratedRun) -> Result<Vec<String>> {
    let mut notes = Vec::new();
    for (index, payload) in committed_readers(run) {
        let first = payload.get("firstRead").ok_or_else(|| AcidError::missing("firstRead"))?;
        let second = payload
            .get("secondRead")
            .ok_or_else(|| AcidError::missing("secondRead"))?;
        if first != second {
            notes.push(format!("reader {index} read {first} then {second}"));
        }
    }
    Ok(notes)
}

fn monotonic_reads(run: &OrchestratedRun) -> Result<Vec<String>> {
    let mut notes = Vec::new();
    for (index, payload) in committed_readers(run) {
        let first = payload.int_list("firstRead")?;
        let second = payload.int_list("secondRead")?;
        let (Some(max_first), Some(min_second)) = (first.iter().max(), second.iter().min()) else {
            return Err(AcidError::missing("balances"));
        };
        if max_first > min_second {
            notes.push(format!(
                "reader {index} saw {first:?} then {second:?}: an observed round vanished"
            ));
        }
    }
    Ok(notes)
}

fn lost_update(run: &OrchestratedRun, check: &Payload) -> Result<Vec<String>> {
    let expected = (run.submitted() - run.aborted()) as i64;
    let mut notes = Vec::new();
    for field in ["numTransferred", "numTransferEdges"] {
        let actual = check.int(field)?;
        if actual != expected {
            notes.push(format!(
                "{field} is {actual}, expected {expected} (submitted - aborted)"
            ));
        }
    }
    Ok(notes)
}

fn write_skew(check: &Payload) -> Result<Vec<String>> {
    Ok(check
        .int_list("violations")?
        .iter()
        .map(|a1| format!("pair ({a1}, {}) has a non-positive balance sum", a1 + 1))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use acid_types::{AbortCause, Params};
    use proptest::prelude::*;

    use super::*;
    use crate::programs::Program;
    use crate::task::Task;

    fn committed(payload: Payload) -> TransactionOutcome {
        TransactionOutcome::Committed(payload)
    }

    fn rejected() -> TransactionOutcome {
        TransactionOutcome::Aborted(AbortCause::Rejected {
            reason: "conflict".to_owned(),
        })
    }

    fn run_of(entries: Vec<(Task, TransactionOutcome)>) -> OrchestratedRun {
        let (tasks, outcomes) = entries.into_iter().unzip();
        OrchestratedRun::new(tasks, outcomes, Duration::ZERO).unwrap()
    }

    fn reader(program: Program) -> Task {
        Task::reader(program, Params::new())
    }

    fn reads(first: i64, second: i64) -> Payload {
        Payload::new().with("firstRead", first).with("secondRead", second)
    }

    #[test]
    fn repeatable_reads_pass_and_fail() {
        let clean = run_of(vec![
            (Task::writer(Program::ImpWriter, Params::new()), committed(Payload::new())),
            (reader(Program::ImpReader), committed(reads(3, 3))),
        ]);
        let judgement = judge(ScenarioId::Imp, &clean, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::Passed);

        let fractured = run_of(vec![
            (Task::writer(Program::ImpWriter, Params::new()), committed(Payload::new())),
            (reader(Program::ImpReader), committed(reads(3, 4))),
            (reader(Program::ImpReader), rejected()),
        ]);
        let judgement = judge(ScenarioId::Imp, &fractured, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert_eq!(judgement.anomalies, 1);
        assert_eq!(judgement.aborted, 1);
        assert_eq!(judgement.notes, vec!["reader 1 read 3 then 4".to_owned()]);
    }

    #[test]
    fn all_aborted_is_inconclusive_not_passed() {
        let run = run_of(vec![
            (reader(Program::FrReader), rejected()),
            (reader(Program::FrReader), rejected()),
        ]);
        let judgement = judge(ScenarioId::Fr, &run, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::Inconclusive);
        assert_eq!(judgement.anomalies, 0);
    }

    #[test]
    fn missing_fixture_is_a_setup_failure() {
        let run = run_of(vec![
            (reader(Program::PmpReader), committed(reads(1, 2))),
            (
                reader(Program::PmpReader),
                TransactionOutcome::Aborted(AbortCause::MissingFixture {
                    detail: "pmpRead result empty".to_owned(),
                }),
            ),
        ]);
        let judgement = judge(ScenarioId::Pmp, &run, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::SetupFailed);
        assert_eq!(judgement.anomalies, 0, "case=setup_failure_is_not_an_anomaly");
    }

    #[test]
    fn g1a_flags_reads_of_rolled_back_value() {
        let writer = Task::writer(
            Program::G1aWriter,
            Params::new().with("accountId", 1_i64).with("balance", 200_i64),
        );
        let run = run_of(vec![
            (writer, TransactionOutcome::Aborted(AbortCause::Requested)),
            (reader(Program::G1aReader), committed(Payload::new().with("aBalance", 99_i64))),
            (reader(Program::G1aReader), committed(Payload::new().with("aBalance", 200_i64))),
        ]);
        let evidence = Evidence {
            baseline: Some(Payload::new().with("aBalance", 99_i64)),
            final_read: None,
        };
        let judgement = judge(ScenarioId::G1a, &run, &evidence);
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert_eq!(judgement.anomalies, 1);
    }

    #[test]
    fn g1a_flags_reads_that_drift_from_baseline() {
        let run = run_of(vec![
            (reader(Program::G1aReader), committed(Payload::new().with("aBalance", 99_i64))),
            (reader(Program::G1aReader), committed(Payload::new().with("aBalance", 150_i64))),
        ]);
        let evidence = Evidence {
            baseline: Some(Payload::new().with("aBalance", 99_i64)),
            final_read: None,
        };
        let judgement = judge(ScenarioId::G1a, &run, &evidence);
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert_eq!(judgement.notes, vec!["reader 1 observed 150, baseline was 99".to_owned()]);

        let judgement = judge(ScenarioId::G1a, &run, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::SetupFailed, "case=baseline_missing");
    }

    #[test]
    fn g1c_detects_two_cycle_and_aborted_source() {
        let task = |txn: i64, a1: i64, a2: i64| {
            Task::writer(
                Program::G1c,
                Params::new()
                    .with("account1Id", a1)
                    .with("account2Id", a2)
                    .with("transactionId", txn),
            )
        };
        let saw = |v: i64| committed(Payload::new().with("account2Balance", v));

        let serial = run_of(vec![
            (task(1, 1, 2), saw(0)),
            (task(2, 2, 1), saw(1)),
            (task(3, 1, 2), saw(2)),
        ]);
        assert_eq!(
            judge(ScenarioId::G1c, &serial, &Evidence::default()).verdict,
            Verdict::Passed
        );

        let cycle = run_of(vec![(task(1, 1, 2), saw(2)), (task(2, 2, 1), saw(1))]);
        let judgement = judge(ScenarioId::G1c, &cycle, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert_eq!(judgement.anomalies, 2);

        let dirty = run_of(vec![(task(1, 1, 2), rejected()), (task(2, 2, 1), saw(1))]);
        let judgement = judge(ScenarioId::G1c, &dirty, &Evidence::default());
        assert!(judgement.notes[0].contains("aborted transaction 1"), "got={:?}", judgement.notes);
    }

    #[test]
    fn g0_compares_common_elements_in_order() {
        let task = |txn: i64| {
            Task::writer(
                Program::G0,
                Params::new()
                    .with("account1Id", 1_i64)
                    .with("account2Id", 2_i64)
                    .with("transactionId", txn),
            )
        };
        let run = run_of(vec![
            (task(1), committed(Payload::new())),
            (task(2), committed(Payload::new())),
            (task(3), rejected()),
        ]);
        let check = |a1: Vec<i64>, t: Vec<i64>, a2: Vec<i64>| Evidence {
            baseline: None,
            final_read: Some(
                Payload::new()
                    .with("a1VersionHistory", a1)
                    .with("tVersionHistory", t)
                    .with("a2VersionHistory", a2),
            ),
        };

        let consistent = check(vec![0, 2, 1], vec![0, 2, 1], vec![0, 2, 1]);
        assert_eq!(judge(ScenarioId::G0, &run, &consistent).verdict, Verdict::Passed);

        let interleaved = check(vec![0, 1, 2], vec![0, 2, 1], vec![0, 1, 2]);
        let judgement = judge(ScenarioId::G0, &run, &interleaved);
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert_eq!(judgement.anomalies, 1);

        let partial = check(vec![0, 1, 2, 3], vec![0, 1, 2], vec![0, 1, 2]);
        let judgement = judge(ScenarioId::G0, &run, &partial);
        assert_eq!(judgement.anomalies, 1, "case=aborted_txn_visible notes={:?}", judgement.notes);
    }

    #[test]
    fn g0_without_final_read_is_setup_failure() {
        let run = run_of(vec![(
            Task::writer(Program::G0, Params::new().with("transactionId", 1_i64)),
            committed(Payload::new()),
        )]);
        let judgement = judge(ScenarioId::G0, &run, &Evidence::default());
        assert_eq!(judgement.verdict, Verdict::SetupFailed);
    }

    #[test]
    fn otv_requires_forward_progress() {
        let lists = |first: Vec<i64>, second: Vec<i64>| {
            committed(Payload::new().with("firstRead", first).with("secondRead", second))
        };
        let run = run_of(vec![
            (reader(Program::OtvReader), lists(vec![2, 2, 2, 2], vec![5, 5, 5, 5])),
            (reader(Program::OtvReader), lists(vec![3, 3, 3, 2], vec![3, 3, 3, 3])),
            (reader(Program::OtvReader), lists(vec![4, 4, 4, 4], vec![4, 3, 4, 4])),
        ]);
        let judgement = judge(ScenarioId::Otv, &run, &Evidence::default());
        assert_eq!(judgement.anomalies, 1);
        assert!(judgement.notes[0].starts_with("reader 2"), "got={:?}", judgement.notes);
    }

    #[test]
    fn lost_update_counts_against_commits() {
        let writer = || Task::writer(Program::LuWriter, Params::new());
        let run = run_of(vec![
            (writer(), committed(Payload::new())),
            (writer(), rejected()),
            (writer(), committed(Payload::new())),
        ]);
        let evidence = |counter: i64, edges: i64| Evidence {
            baseline: None,
            final_read: Some(
                Payload::new()
                    .with("numTransferred", counter)
                    .with("numTransferEdges", edges),
            ),
        };
        assert_eq!(judge(ScenarioId::Lu, &run, &evidence(2, 2)).verdict, Verdict::Passed);
        let judgement = judge(ScenarioId::Lu, &run, &evidence(1, 2));
        assert_eq!(judgement.verdict, Verdict::AnomalyDetected);
        assert!(judgement.notes[0].starts_with("numTransferred is 1"));
    }

    #[test]
    fn atomicity_checks_counts_and_collisions() {
        let task = |account2: i64| {
            Task::writer(
                Program::AtomicityC,
                Params::new()
                    .with("account1Id", 1_i64)
                    .with("account2Id", account2)
                    .with("newTrans", 200_i64),
            )
        };
        let counts = |accounts: i64, names: i64, transferred: i64| {
            Payload::new()
                .with("numAccounts", accounts)
                .with("numNames", names)
                .with("numTransferred", transferred)
        };
        let run = run_of(vec![(task(3), committed(Payload::new())), (task(2), rejected())]);
        let good = Evidence {
            baseline: Some(counts(2, 2, 3)),
            final_read: Some(counts(3, 2, 4)),
        };
        assert_eq!(judge(ScenarioId::AtomicityC, &run, &good).verdict, Verdict::Passed);

        let leaked = Evidence {
            baseline: Some(counts(2, 2, 3)),
            final_read: Some(counts(3, 2, 5)),
        };
        assert_eq!(
            judge(ScenarioId::AtomicityC, &run, &leaked).verdict,
            Verdict::AnomalyDetected,
            "case=aborted_append_persisted"
        );

        let duplicate = run_of(vec![(task(3), committed(Payload::new())), (task(2), committed(Payload::new()))]);
        let evidence = Evidence {
            baseline: Some(counts(2, 2, 3)),
            final_read: Some(counts(4, 2, 5)),
        };
        let judgement = judge(ScenarioId::AtomicityC, &duplicate, &evidence);
        assert_eq!(judgement.anomalies, 1);
        assert!(judgement.notes[0].contains("existing account id 2"));
    }

    #[test]
    fn write_skew_lists_overdrawn_pairs() {
        let run = run_of(vec![(
            Task::writer(Program::WsWriter, Params::new()),
            committed(Payload::new()),
        )]);
        let evidence = Evidence {
            baseline: None,
            final_read: Some(Payload::new().with("violations", vec![3_i64, 7])),
        };
        let judgement = judge(ScenarioId::Ws, &run, &evidence);
        assert_eq!(judgement.anomalies, 2);
        assert_eq!(judgement.notes[0], "pair (3, 4) has a non-positive balance sum");
    }

    #[test]
    fn notes_are_capped() {
        let entries = (0..30)
            .map(|_| (reader(Program::G1bReader), committed(Payload::new().with("aBalance", 200_i64))))
            .collect();
        let judgement = judge(ScenarioId::G1b, &run_of(entries), &Evidence::default());
        assert_eq!(judgement.anomalies, 30);
        assert_eq!(judgement.notes.len(), MAX_NOTES + 1);
        assert_eq!(judgement.notes.last().unwrap(), "... and 10 more");
    }

    proptest! {
        #[test]
        fn odd_balances_never_flagged(balances in proptest::collection::vec(any::<i32>(), 1..50)) {
            let entries = balances
                .iter()
                .map(|b| {
                    let odd = i64::from(*b) * 2 + 1;
                    (reader(Program::G1bReader), committed(Payload::new().with("aBalance", odd)))
                })
                .collect();
            let judgement = judge(ScenarioId::G1b, &run_of(entries), &Evidence::default());
            prop_assert_eq!(judgement.anomalies, 0);
        }

        #[test]
        fn identical_reads_never_flagged(values in proptest::collection::vec(any::<i64>(), 1..50)) {
            let entries = values
                .iter()
                .map(|v| (reader(Program::FrReader), committed(reads(*v, *v))))
                .collect();
            let judgement = judge(ScenarioId::Fr, &run_of(entries), &Evidence::default());
            prop_assert_eq!(judgement.verdict, Verdict::Passed);
        }
    }
}
