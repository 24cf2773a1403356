//! Named store operations.
//!
//! Every step a scenario transaction takes against the store is one
//! [`Operation`]. Adapters translate each operation into their native query
//! form; the harness never sees query text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    // ─── Atomicity ───
    AtomicityInit,
    /// Append to account1's history, create account2 and a transfer to it.
    AtomicityC,
    /// Append to account1's history.
    AtomicityRbAppend,
    /// Count accounts with id `account2Id` (`numMatches`).
    AtomicityRbProbe,
    /// Create account2 with an empty history.
    AtomicityRbCreate,
    /// `numAccounts`, `numNames`, `numTransferred` over the whole graph.
    AtomicityCheck,

    // ─── G0: dirty write ───
    G0Init,
    /// Append `transactionId` to both endpoints and the edge between them.
    G0,
    G0Check,

    // ─── G1a: aborted read ───
    G1aInit,
    /// Resolve the account's store-internal id (`internalId`).
    G1aLocate,
    G1aWrite,
    G1aRead,

    // ─── G1b: intermediate read ───
    G1bInit,
    G1bWrite,
    G1bRead,

    // ─── G1c: circular information flow ───
    G1cInit,
    /// Set account1's balance to `transactionId`, read account2's balance.
    G1c,

    // ─── IMP: item-many-preceders ───
    ImpInit,
    ImpWrite,
    ImpRead,

    // ─── PMP: predicate-many-preceders ───
    PmpInit,
    PmpWrite,
    /// Count incoming transfers of `accountId`.
    PmpRead,

    // ─── OTV: observed transaction vanishes ───
    OtvInit,
    /// Increment every balance on the transfer cycle starting at `accountId`.
    OtvWrite,
    /// Read every balance on the cycle starting at `accountId`.
    OtvRead,

    // ─── FR: fractured read ───
    FrInit,
    FrWrite,
    FrRead,

    // ─── LU: lost update ───
    LuInit,
    /// Increment `numTransferred` and add one outgoing transfer.
    LuWrite,
    LuRead,

    // ─── WS: write skew ───
    WsInit,
    WsRead,
    WsWithdraw,
    /// Pairs whose balance sum is not positive (`violations`).
    WsCheck,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 37] = [
        Self::AtomicityInit,
        Self::AtomicityC,
        Self::AtomicityRbAppend,
        Self::AtomicityRbProbe,
        Self::AtomicityRbCreate,
        Self::AtomicityCheck,
        Self::G0Init,
        Self::G0,
        Self::G0Check,
        Self::G1aInit,
        Self::G1aLocate,
        Self::G1aWrite,
        Self::G1aRead,
        Self::G1bInit,
        Self::G1bWrite,
        Self::G1bRead,
        Self::G1cInit,
        Self::G1c,
        Self::ImpInit,
        Self::ImpWrite,
        Self::ImpRead,
        Self::PmpInit,
        Self::PmpWrite,
        Self::PmpRead,
        Self::OtvInit,
        Self::OtvWrite,
        Self::OtvRead,
        Self::FrInit,
        Self::FrWrite,
        Self::FrRead,
        Self::LuInit,
        Self::LuWrite,
        Self::LuRead,
        Self::WsInit,
        Self::WsRead,
        Self::WsWithdraw,
        Self::WsCheck,
    ];

    /// Stable wire name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtomicityInit => "atomicityInit",
            Self::AtomicityC => "atomicityC",
            Self::AtomicityRbAppend => "atomicityRbAppend",
            Self::AtomicityRbProbe => "atomicityRbProbe",
            Self::AtomicityRbCreate => "atomicityRbCreate",
            Self::AtomicityCheck => "atomicityCheck",
            Self::G0Init => "g0Init",
            Self::G0 => "g0",
            Self::G0Check => "g0Check",
            Self::G1aInit => "g1aInit",
            Self::G1aLocate => "g1aLocate",
            Self::G1aWrite => "g1aWrite",
            Self::G1aRead => "g1aRead",
            Self::G1bInit => "g1bInit",
            Self::G1bWrite => "g1bWrite",
            Self::G1bRead => "g1bRead",
            Self::G1cInit => "g1cInit",
            Self::G1c => "g1c",
            Self::ImpInit => "impInit",
            Self::ImpWrite => "impWrite",
            Self::ImpRead => "impRead",
            Self::PmpInit => "pmpInit",
            Self::PmpWrite => "pmpWrite",
            Self::PmpRead => "pmpRead",
            Self::OtvInit => "otvInit",
            Self::OtvWrite => "otvWrite",
            Self::OtvRead => "otvRead",
            Self::FrInit => "frInit",
            Self::FrWrite => "frWrite",
            Self::FrRead => "frRead",
            Self::LuInit => "luInit",
            Self::LuWrite => "luWrite",
            Self::LuRead => "luRead",
            Self::WsInit => "wsInit",
            Self::WsRead => "wsRead",
            Self::WsWithdraw => "wsWithdraw",
            Self::WsCheck => "wsCheck",
        }
    }

    /// Look up an operation by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Whether this operation loads a scenario fixture.
    #[must_use]
    pub const fn is_init(self) -> bool {
        matches!(
            self,
            Self::AtomicityInit
                | Self::G0Init
                | Self::G1aInit
                | Self::G1bInit
                | Self::G1cInit
                | Self::ImpInit
                | Self::PmpInit
                | Self::OtvInit
                | Self::FrInit
                | Self::LuInit
                | Self::WsInit
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_are_unique_and_resolvable() {
        let mut seen = HashSet::new();
        for op in Operation::ALL {
            assert!(seen.insert(op.as_str()), "case=duplicate name={op}");
            assert_eq!(Operation::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Operation::from_name("dropEverything"), None);
    }

    #[test]
    fn serde_name_matches_wire_name() {
        for op in Operation::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()), "case=serde op={op}");
        }
    }

    #[test]
    fn init_operations() {
        let inits = Operation::ALL.iter().filter(|op| op.is_init()).count();
        assert_eq!(inits, 11);
        assert!(!Operation::G1aRead.is_init());
    }
}
