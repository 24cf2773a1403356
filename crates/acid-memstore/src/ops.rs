//! Graph-level implementation of every named operation.

use acid_error::{AcidError, Result};
use acid_types::{AccountId, Operation, Params, Payload};

use crate::graph::{Account, Graph, Mutation};

/// Initial balance of the first account of every write-skew pair.
const WS_FIRST_BALANCE: i64 = 70;
/// Initial balance of the second account of every write-skew pair.
const WS_SECOND_BALANCE: i64 = 80;
/// Pairs created by `wsInit` when `numPairs` is not given.
const WS_DEFAULT_PAIRS: i64 = 10;

fn balance_of(account: &Account, op: Operation) -> Result<i64> {
    account
        .balance
        .ok_or_else(|| AcidError::empty_result(op.as_str()))
}

fn cycle_balances(graph: &Graph, start: AccountId, op: Operation) -> Result<Vec<i64>> {
    graph
        .cycle_from(start, op)?
        .into_iter()
        .map(|id| balance_of(graph.account(id, op)?, op))
        .collect()
}

fn increment_cycle(m: &mut Mutation<'_>, start: AccountId, op: Operation) -> Result<Payload> {
    let ids = m.graph.cycle_from(start, op)?;
    for id in &ids {
        let account = m.account_mut(*id, op)?;
        account.balance = Some(account.balance.unwrap_or(0) + 1);
    }
    Ok(Payload::new().with("numAccounts", ids.len() as i64))
}

fn init_cycle(m: &mut Mutation<'_>) -> Result<Payload> {
    for id in 1..=4 {
        m.create_account(Account::with_balance(id, 0))?;
    }
    for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
        m.create_transfer(from, to, None, Vec::new())?;
    }
    Ok(Payload::new())
}

/// Run `op` against the graph behind `m`.
pub fn apply(m: &mut Mutation<'_>, op: Operation, params: &Params) -> Result<Payload> {
    match op {
        Operation::AtomicityInit => {
            m.create_account(Account {
                name: Some("AliceAcc".to_owned()),
                trans_history: vec![100],
                ..Account::new(1)
            })?;
            m.create_account(Account {
                name: Some("BobAcc".to_owned()),
                trans_history: vec![50, 150],
                ..Account::new(2)
            })?;
            Ok(Payload::new())
        }
        Operation::AtomicityC => {
            let account1 = params.int("account1Id")?;
            let account2 = params.int("account2Id")?;
            let new_trans = params.int("newTrans")?;
            m.account_mut(account1, op)?.trans_history.push(new_trans);
            m.create_account(Account::new(account2))?;
            m.create_transfer(account1, account2, Some(new_trans), Vec::new())?;
            Ok(Payload::new())
        }
        Operation::AtomicityRbAppend => {
            let account1 = params.int("account1Id")?;
            let new_trans = params.int("newTrans")?;
            m.account_mut(account1, op)?.trans_history.push(new_trans);
            Ok(Payload::new())
        }
        Operation::AtomicityRbProbe => {
            let account2 = params.int("account2Id")?;
            let matches = i64::from(m.graph.accounts.contains_key(&account2));
            Ok(Payload::new().with("numMatches", matches))
        }
        Operation::AtomicityRbCreate => {
            m.create_account(Account::new(params.int("account2Id")?))?;
            Ok(Payload::new())
        }
        Operation::AtomicityCheck => {
            let accounts = m.graph.accounts.values();
            let num_accounts = accounts.len() as i64;
            let num_names = m.graph.accounts.values().filter(|a| a.name.is_some()).count() as i64;
            let num_transferred = m
                .graph
                .accounts
                .values()
                .map(|a| a.trans_history.len() as i64)
                .sum::<i64>();
            Ok(Payload::new()
                .with("numAccounts", num_accounts)
                .with("numNames", num_names)
                .with("numTransferred", num_transferred))
        }

        Operation::G0Init => {
            for id in [1, 2] {
                m.create_account(Account {
                    version_history: vec![0],
                    ..Account::new(id)
                })?;
            }
            m.create_transfer(1, 2, None, vec![0])?;
            Ok(Payload::new())
        }
        Operation::G0 => {
            let account1 = params.int("account1Id")?;
            let account2 = params.int("account2Id")?;
            let txn_id = params.int("transactionId")?;
            let edge = m
                .graph
                .outgoing(account1, Some(account2))
                .ok_or_else(|| AcidError::empty_result(op.as_str()))?
                .id;
            m.account_mut(account1, op)?.version_history.push(txn_id);
            m.transfer_mut(edge, op)?.version_history.push(txn_id);
            m.account_mut(account2, op)?.version_history.push(txn_id);
            Ok(Payload::new())
        }
        Operation::G0Check => {
            let account1 = params.int("account1Id")?;
            let account2 = params.int("account2Id")?;
            let edge = m
                .graph
                .outgoing(account1, Some(account2))
                .ok_or_else(|| AcidError::empty_result(op.as_str()))?;
            Ok(Payload::new()
                .with(
                    "a1VersionHistory",
                    m.graph.account(account1, op)?.version_history.clone(),
                )
                .with("tVersionHistory", edge.version_history.clone())
                .with(
                    "a2VersionHistory",
                    m.graph.account(account2, op)?.version_history.clone(),
                ))
        }

        Operation::G1aInit | Operation::G1bInit => {
            m.create_account(Account::with_balance(1, 99))?;
            Ok(Payload::new())
        }
        Operation::G1aLocate => {
            let id = m.graph.account(params.int("accountId")?, op)?.id;
            Ok(Payload::new().with("internalId", id))
        }
        Operation::G1aWrite => {
            let id = params.int("internalId")?;
            m.account_mut(id, op)?.balance = Some(params.int("balance")?);
            Ok(Payload::new())
        }
        Operation::G1bWrite => {
            let id = params.int("accountId")?;
            m.account_mut(id, op)?.balance = Some(params.int("balance")?);
            Ok(Payload::new())
        }
        Operation::G1aRead | Operation::G1bRead => {
            let account = m.graph.account(params.int("accountId")?, op)?;
            Ok(Payload::new().with("aBalance", balance_of(account, op)?))
        }

        Operation::G1cInit => {
            m.create_account(Account::with_balance(1, 0))?;
            m.create_account(Account::with_balance(2, 0))?;
            Ok(Payload::new())
        }
        Operation::G1c => {
            let account1 = params.int("account1Id")?;
            let account2 = params.int("account2Id")?;
            m.account_mut(account1, op)?.balance = Some(params.int("transactionId")?);
            let observed = balance_of(m.graph.account(account2, op)?, op)?;
            Ok(Payload::new().with("account2Balance", observed))
        }

        Operation::ImpInit => {
            m.create_account(Account::with_balance(1, 1))?;
            Ok(Payload::new())
        }
        Operation::ImpWrite => {
            let account = m.account_mut(params.int("accountId")?, op)?;
            let next = balance_of(account, op)? + 1;
            account.balance = Some(next);
            Ok(Payload::new())
        }
        Operation::ImpRead => {
            let account = m.graph.account(params.int("accountId")?, op)?;
            Ok(Payload::new().with("balance", balance_of(account, op)?))
        }

        Operation::PmpInit => {
            m.create_account(Account::new(1))?;
            m.create_account(Account::new(2))?;
            Ok(Payload::new())
        }
        Operation::PmpWrite => {
            let account1 = m.graph.account(params.int("account1Id")?, op)?.id;
            let account2 = m.graph.account(params.int("account2Id")?, op)?.id;
            m.create_transfer(account1, account2, None, Vec::new())?;
            Ok(Payload::new())
        }
        Operation::PmpRead => {
            let account = m.graph.account(params.int("accountId")?, op)?.id;
            let count = m.graph.transfers.values().filter(|t| t.to == account).count();
            Ok(Payload::new().with("numTransfers", count as i64))
        }

        Operation::OtvInit | Operation::FrInit => init_cycle(m),
        Operation::OtvWrite | Operation::FrWrite => {
            increment_cycle(m, params.int("accountId")?, op)
        }
        Operation::OtvRead | Operation::FrRead => {
            let balances = cycle_balances(&*m.graph, params.int("accountId")?, op)?;
            Ok(Payload::new().with("balances", balances))
        }

        Operation::LuInit => {
            m.create_account(Account::new(1))?;
            Ok(Payload::new())
        }
        Operation::LuWrite => {
            let account1 = params.int("account1Id")?;
            let account2 = params.int("account2Id")?;
            m.account_mut(account1, op)?.num_transferred += 1;
            m.create_account(Account::new(account2))?;
            m.create_transfer(account1, account2, None, Vec::new())?;
            Ok(Payload::new())
        }
        Operation::LuRead => {
            let account = m.graph.account(params.int("accountId")?, op)?;
            let edges = m
                .graph
                .transfers
                .values()
                .filter(|t| t.from == account.id)
                .count();
            Ok(Payload::new()
                .with("numTransferred", account.num_transferred)
                .with("numTransferEdges", edges as i64))
        }

        Operation::WsInit => {
            let pairs = match params.int("numPairs") {
                Ok(n) => n,
                Err(AcidError::MissingParameter { .. }) => WS_DEFAULT_PAIRS,
                Err(err) => return Err(err),
            };
            for k in 1..=pairs {
                m.create_account(Account::with_balance(2 * k - 1, WS_FIRST_BALANCE))?;
                m.create_account(Account::with_balance(2 * k, WS_SECOND_BALANCE))?;
            }
            Ok(Payload::new())
        }
        Operation::WsRead => {
            let a1 = balance_of(m.graph.account(params.int("account1Id")?, op)?, op)?;
            let a2 = balance_of(m.graph.account(params.int("account2Id")?, op)?, op)?;
            Ok(Payload::new().with("a1Balance", a1).with("a2Balance", a2))
        }
        Operation::WsWithdraw => {
            let amount = params.int("amount")?;
            let account = m.account_mut(params.int("accountId")?, op)?;
            let next = balance_of(account, op)? - amount;
            account.balance = Some(next);
            Ok(Payload::new())
        }
        Operation::WsCheck => {
            let mut pairs = 0_i64;
            let mut violations = Vec::new();
            for account in m.graph.accounts.values().filter(|a| a.id % 2 == 1) {
                let Some(partner) = m.graph.accounts.get(&(account.id + 1)) else {
                    continue;
                };
                pairs += 1;
                let sum = account.balance.unwrap_or(0) + partner.balance.unwrap_or(0);
                if sum <= 0 {
                    violations.push(account.id);
                }
            }
            Ok(Payload::new()
                .with("numPairs", pairs)
                .with("violations", violations))
        }
    }
}
