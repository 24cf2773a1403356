//! Data model and store contract shared by the harness and its adapters.
//!
//! - [`value`]: scalar and sequence values carried by operation parameters
//!   and result payloads.
//! - [`operation`]: the closed set of named store operations.
//! - [`outcome`]: per-task transaction outcomes.
//! - [`store`]: the [`TransactionalStore`] trait every adapter implements.

pub mod operation;
pub mod outcome;
pub mod store;
pub mod value;

pub use operation::Operation;
pub use outcome::{AbortCause, TransactionOutcome};
pub use store::{TransactionalStore, TxHandle};
pub use value::{Fields, Params, Payload, Value};

/// Account identity inside a single test run.
pub type AccountId = i64;
