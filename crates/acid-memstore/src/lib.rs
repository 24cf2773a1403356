//! In-memory account/transfer graph store.
//!
//! [`MemoryStore`] implements every [`acid_types::Operation`] over a small
//! property graph and can run under three [`IsolationMode`]s. Under
//! `Serializable` the harness catalog must pass; the weaker modes exist so
//! the judge can be shown to catch the anomalies they admit.

mod graph;
mod ops;
mod store;

pub use store::{IsolationMode, MemoryStore, StoreStats};
