//! Per-task transaction outcomes.

use acid_error::{AbortKind, AcidError};
use serde::{Deserialize, Serialize};

use crate::value::Payload;

/// Why a task's transaction did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortCause {
    /// The transaction body rolled back on purpose.
    Requested,
    /// The store rejected or rolled back the transaction.
    Rejected { reason: String },
    /// The adapter failed to complete a call.
    Adapter { detail: String },
    /// A read found no rows: the scenario fixture is missing.
    MissingFixture { detail: String },
}

impl AbortCause {
    /// Classify an error raised while a task was running.
    #[must_use]
    pub fn from_error(err: &AcidError) -> Self {
        match err.abort_kind() {
            AbortKind::Rejected => Self::Rejected {
                reason: err.to_string(),
            },
            AbortKind::MissingFixture => Self::MissingFixture {
                detail: err.to_string(),
            },
            AbortKind::Adapter => Self::Adapter {
                detail: err.to_string(),
            },
        }
    }
}

/// Result of one task: the committed payload, or why it aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOutcome {
    Committed(Payload),
    Aborted(AbortCause),
}

impl TransactionOutcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Payload of a committed task.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Committed(payload) => Some(payload),
            Self::Aborted(_) => None,
        }
    }

    #[must_use]
    pub const fn abort_cause(&self) -> Option<&AbortCause> {
        match self {
            Self::Committed(_) => None,
            Self::Aborted(cause) => Some(cause),
        }
    }

    /// Whether the abort came from an adapter failure.
    #[must_use]
    pub const fn is_adapter_failure(&self) -> bool {
        matches!(self, Self::Aborted(AbortCause::Adapter { .. }))
    }

    /// Whether the abort came from a missing fixture row.
    #[must_use]
    pub const fn is_missing_fixture(&self) -> bool {
        matches!(self, Self::Aborted(AbortCause::MissingFixture { .. }))
    }
}

impl From<&AcidError> for TransactionOutcome {
    fn from(err: &AcidError) -> Self {
        Self::Aborted(AbortCause::from_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Fields;

    #[test]
    fn errors_map_to_abort_causes() {
        let outcome = TransactionOutcome::from(&AcidError::aborted("write conflict"));
        assert!(matches!(
            outcome,
            TransactionOutcome::Aborted(AbortCause::Rejected { .. })
        ));

        let outcome = TransactionOutcome::from(&AcidError::adapter("broken pipe"));
        assert!(outcome.is_adapter_failure());

        let outcome = TransactionOutcome::from(&AcidError::empty_result("pmpRead"));
        assert!(outcome.is_missing_fixture());
        assert!(outcome.payload().is_none());
    }

    #[test]
    fn committed_exposes_payload() {
        let outcome = TransactionOutcome::Committed(Fields::new().with("aBalance", 99_i64));
        assert!(outcome.is_committed());
        assert_eq!(outcome.payload().unwrap().int("aBalance").unwrap(), 99);
        assert!(outcome.abort_cause().is_none());
    }

    #[test]
    fn abort_cause_json_shape() {
        let cause = AbortCause::Rejected {
            reason: "transaction aborted: write conflict".to_owned(),
        };
        let json = serde_json::to_string(&cause).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"rejected","reason":"transaction aborted: write conflict"}"#
        );
    }
}
