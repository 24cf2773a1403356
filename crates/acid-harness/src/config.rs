//! Harness configuration: pool size, timing, seed, scenario selection and
//! per-scenario plan overrides. Loadable from TOML.
//!
//! ```toml
//! pool_size = 8
//! seed = 42
//! scenarios = ["G0", "LU", "WS"]
//!
//! [plans.WS]
//! writers = 100
//! delay_ms = 50
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use acid_error::{AcidError, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{Scenario, ScenarioCatalog, ScenarioId, ScenarioPlan};
use crate::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_POOL_SIZE, DEFAULT_SEED, DEFAULT_SETTLE_DELAY};

/// Partial [`ScenarioPlan`]: only the fields that are set replace the
/// standard plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanOverrides {
    pub writers: Option<usize>,
    pub readers: Option<usize>,
    pub rounds: Option<usize>,
    pub delay_ms: Option<u64>,
    pub pairs: Option<usize>,
}

impl PlanOverrides {
    #[must_use]
    pub fn apply(&self, mut plan: ScenarioPlan) -> ScenarioPlan {
        if let Some(writers) = self.writers {
            plan.writers = writers;
        }
        if let Some(readers) = self.readers {
            plan.readers = readers;
        }
        if let Some(rounds) = self.rounds {
            plan.rounds = rounds;
        }
        if let Some(delay_ms) = self.delay_ms {
            plan.delay_ms = delay_ms;
        }
        if let Some(pairs) = self.pairs {
            plan.pairs = pairs;
        }
        plan
    }
}

/// Static run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Worker threads per scenario.
    pub pool_size: usize,
    /// Overall wait for one scenario's pool to drain.
    pub drain_timeout_secs: u64,
    /// Pause before and after each wipe.
    pub settle_delay_ms: u64,
    /// Base seed for randomized task parameters.
    pub seed: u64,
    /// Scenario names to run, in catalog order. `None` runs all.
    pub scenarios: Option<Vec<String>>,
    /// Plan overrides keyed by scenario name.
    pub plans: BTreeMap<String, PlanOverrides>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            drain_timeout_secs: DEFAULT_DRAIN_TIMEOUT.as_secs(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            seed: DEFAULT_SEED,
            scenarios: None,
            plans: BTreeMap::new(),
        }
    }
}

fn lookup(name: &str) -> Result<ScenarioId> {
    ScenarioId::from_name(name).ok_or_else(|| AcidError::config(format!("unknown scenario: {name}")))
}

impl HarnessConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| AcidError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| AcidError::config(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(AcidError::config("pool_size must be at least 1"));
        }
        if self.drain_timeout_secs == 0 {
            return Err(AcidError::config("drain_timeout_secs must be at least 1"));
        }
        if let Some(names) = &self.scenarios {
            if names.is_empty() {
                return Err(AcidError::config("scenario selection is empty"));
            }
            for name in names {
                lookup(name)?;
            }
        }
        for name in self.plans.keys() {
            lookup(name)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Standard plan for `id` with this config's overrides applied.
    #[must_use]
    pub fn plan_for(&self, id: ScenarioId) -> ScenarioPlan {
        let standard = ScenarioPlan::default_for(id);
        self.plans
            .iter()
            .find(|(name, _)| ScenarioId::from_name(name) == Some(id))
            .map_or(standard, |(_, overrides)| overrides.apply(standard))
    }

    /// Selected scenarios with their effective plans, in catalog order.
    pub fn catalog(&self) -> Result<ScenarioCatalog> {
        let selected: Vec<ScenarioId> = match &self.scenarios {
            None => ScenarioId::ALL.to_vec(),
            Some(names) => {
                let wanted = names.iter().map(|n| lookup(n)).collect::<Result<Vec<_>>>()?;
                ScenarioId::ALL
                    .into_iter()
                    .filter(|id| wanted.contains(id))
                    .collect()
            }
        };
        Ok(ScenarioCatalog::new(
            selected
                .into_iter()
                .map(|id| Scenario {
                    id,
                    plan: self.plan_for(id),
                })
                .collect(),
        ))
    }
}
