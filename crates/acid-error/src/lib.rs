//! Error taxonomy for the isolation-anomaly harness.
//!
//! Store adapters, the orchestrator and the harness all speak [`AcidError`].
//! Two variants are *expected* during a run: [`AcidError::TransactionAborted`]
//! (the store rolled a transaction back) and [`AcidError::Adapter`] (the
//! store call itself failed). Both are captured by the orchestrator as
//! aborted outcomes and never escape a task.

use thiserror::Error;

/// Primary error type for the harness workspace.
#[derive(Error, Debug)]
pub enum AcidError {
    // === Store outcomes ===
    /// The store rejected or rolled back the transaction.
    #[error("transaction aborted: {reason}")]
    TransactionAborted { reason: String },

    /// Network, protocol or driver failure inside an adapter.
    #[error("adapter error: {detail}")]
    Adapter { detail: String },

    /// A read operation matched no rows.
    #[error("{operation} result empty")]
    EmptyResult { operation: String },

    /// The transaction handle is not open on this store.
    #[error("unknown transaction handle: {handle}")]
    UnknownTransaction { handle: u64 },

    // === Operation parameters ===
    /// A required operation parameter or payload field is absent.
    #[error("missing parameter: {name}")]
    MissingParameter { name: String },

    /// A parameter or payload field has the wrong value kind.
    #[error("parameter {name} is not {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    // === Harness ===
    /// The judge detected an isolation anomaly.
    #[error("invariant violation in {scenario}: {detail}")]
    InvariantViolation { scenario: String, detail: String },

    /// Wipe, init, baseline or final read failed; the scenario is skipped.
    #[error("setup failure in {scenario} during {stage}: {detail}")]
    SetupFailure {
        scenario: String,
        stage: String,
        detail: String,
    },

    /// The worker pool did not drain within the overall wait.
    #[error("worker pool did not drain within {timeout_secs}s ({unresolved} tasks unresolved)")]
    DrainTimeout { timeout_secs: u64, unresolved: usize },

    /// Invalid harness configuration.
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal logic error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// How an expected task failure should be classified by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortKind {
    /// The store rolled the transaction back.
    Rejected,
    /// The adapter failed to complete the call.
    Adapter,
    /// A read found no rows.
    MissingFixture,
}

impl AcidError {
    /// Create a transaction-aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            reason: reason.into(),
        }
    }

    /// Create an adapter error.
    pub fn adapter(detail: impl Into<String>) -> Self {
        Self::Adapter {
            detail: detail.into(),
        }
    }

    /// Create an empty-result error for the named operation.
    pub fn empty_result(operation: impl Into<String>) -> Self {
        Self::EmptyResult {
            operation: operation.into(),
        }
    }

    /// Create a missing-parameter error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a configuration error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Create a setup-failure error.
    pub fn setup(
        scenario: impl Into<String>,
        stage: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::SetupFailure {
            scenario: scenario.into(),
            stage: stage.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error means the store rolled the transaction back.
    #[must_use]
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::TransactionAborted { .. })
    }

    /// Classify this error as a task abort.
    ///
    /// Every error raised inside a task becomes an aborted outcome. Errors
    /// that are neither store rollbacks nor missing rows are treated as
    /// adapter failures.
    #[must_use]
    pub const fn abort_kind(&self) -> AbortKind {
        match self {
            Self::TransactionAborted { .. } => AbortKind::Rejected,
            Self::EmptyResult { .. } => AbortKind::MissingFixture,
            _ => AbortKind::Adapter,
        }
    }
}

/// Result type alias using `AcidError`.
pub type Result<T> = std::result::Result<T, AcidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AcidError::empty_result("g1aRead");
        assert_eq!(err.to_string(), "g1aRead result empty");

        let err = AcidError::setup("G0", "init", "store unreachable");
        assert_eq!(
            err.to_string(),
            "setup failure in G0 during init: store unreachable"
        );

        let err = AcidError::DrainTimeout {
            timeout_secs: 3600,
            unresolved: 3,
        };
        assert_eq!(
            err.to_string(),
            "worker pool did not drain within 3600s (3 tasks unresolved)"
        );
    }

    #[test]
    fn abort_classification() {
        assert!(AcidError::aborted("write conflict").is_abort());
        assert!(!AcidError::adapter("connection reset").is_abort());

        assert_eq!(
            AcidError::aborted("write conflict").abort_kind(),
            AbortKind::Rejected
        );
        assert_eq!(
            AcidError::adapter("connection reset").abort_kind(),
            AbortKind::Adapter
        );
        assert_eq!(
            AcidError::empty_result("impRead").abort_kind(),
            AbortKind::MissingFixture
        );
        assert_eq!(
            AcidError::missing("accountId").abort_kind(),
            AbortKind::Adapter
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AcidError = io.into();
        assert!(matches!(err, AcidError::Io(_)));
    }
}
