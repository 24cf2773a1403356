//! Per-scenario and whole-run reports.
//!
//! The JSON form is versioned so downstream tooling can reject reports it
//! does not understand.

use std::fmt::Write as _;
use std::path::Path;

use acid_error::{AcidError, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::ScenarioId;
use crate::judge::{Judgement, Verdict};

/// Schema identifier carried by every serialized report.
pub const REPORT_SCHEMA_VERSION: &str = "acid-harness.report.v1";

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: ScenarioId,
    pub anomaly: String,
    pub submitted: usize,
    pub aborted: usize,
    pub adapter_errors: usize,
    pub anomalies: usize,
    pub verdict: Verdict,
    pub notes: Vec<String>,
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    #[must_use]
    pub fn from_judgement(scenario: ScenarioId, judgement: Judgement, elapsed_ms: u64) -> Self {
        Self {
            scenario,
            anomaly: scenario.anomaly().to_owned(),
            submitted: judgement.submitted,
            aborted: judgement.aborted,
            adapter_errors: judgement.adapter_errors,
            anomalies: judgement.anomalies,
            verdict: judgement.verdict,
            notes: judgement.notes,
            elapsed_ms,
        }
    }

    /// Report for a scenario whose fixture could not be established.
    #[must_use]
    pub fn setup_failed(scenario: ScenarioId, err: &AcidError, elapsed_ms: u64) -> Self {
        Self {
            scenario,
            anomaly: scenario.anomaly().to_owned(),
            submitted: 0,
            aborted: 0,
            adapter_errors: 0,
            anomalies: 0,
            verdict: Verdict::SetupFailed,
            notes: vec![err.to_string()],
            elapsed_ms,
        }
    }
}

/// Outcome of a full harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessReport {
    pub schema_version: String,
    pub store: String,
    pub seed: u64,
    pub pool_size: usize,
    pub scenarios: Vec<ScenarioReport>,
    pub elapsed_ms: u64,
}

impl HarnessReport {
    #[must_use]
    pub fn new(store: &str, seed: u64, pool_size: usize) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION.to_owned(),
            store: store.to_owned(),
            seed,
            pool_size,
            scenarios: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Whether every scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.verdict.is_pass())
    }

    /// Scenarios that did not pass, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.verdict.is_pass())
    }

    #[must_use]
    pub fn get(&self, scenario: ScenarioId) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }

    /// One-line summary suitable for CI logs.
    #[must_use]
    pub fn triage_line(&self) -> String {
        let failed: Vec<String> = self
            .failures()
            .map(|s| format!("{}={}", s.scenario.name(), s.verdict))
            .collect();
        if failed.is_empty() {
            format!(
                "PASS: {} scenarios against {} (seed={:#x})",
                self.scenarios.len(),
                self.store,
                self.seed
            )
        } else {
            format!(
                "FAIL: {}/{} scenarios against {} (seed={:#x}): {}",
                failed.len(),
                self.scenarios.len(),
                self.store,
                self.seed,
                failed.join(", ")
            )
        }
    }

    /// Fixed-width text table, one row per scenario plus its notes.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "store: {}  seed: {:#x}  pool: {}", self.store, self.seed, self.pool_size);
        let _ = writeln!(
            out,
            "{:<12} {:<28} {:>9} {:>7} {:>7} {:>9}  {}",
            "scenario", "anomaly", "submitted", "aborted", "adapter", "anomalies", "verdict"
        );
        for s in &self.scenarios {
            let _ = writeln!(
                out,
                "{:<12} {:<28} {:>9} {:>7} {:>7} {:>9}  {}",
                s.scenario.name(),
                s.anomaly,
                s.submitted,
                s.aborted,
                s.adapter_errors,
                s.anomalies,
                s.verdict
            );
            for note in &s.notes {
                let _ = writeln!(out, "    - {note}");
            }
        }
        let _ = write!(out, "{}", self.triage_line());
        out
    }

    /// # Errors
    ///
    /// Returns `AcidError::Internal` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AcidError::Internal(format!("report serialization: {e}")))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
