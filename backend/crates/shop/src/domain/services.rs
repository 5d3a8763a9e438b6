//! Domain Services
//!
//! Pure ledger rules shared by every storage backend. The PostgreSQL
//! implementation runs them between its locked reads and its writes.

use crate::domain::value_objects::{Amount, Username};
use crate::error::{LedgerError, LedgerResult};

/// Which slot of the canonical lock order holds an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

/// Sender and receiver of a transfer.
///
/// The pair owns the single comparison that decides the canonical lock
/// order (byte-wise ascending). The sender's slot is derived from that same
/// comparison, so lock order and role lookup can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPair {
    from: Username,
    to: Username,
    sender_slot: Slot,
}

impl AccountPair {
    pub fn new(from: Username, to: Username) -> LedgerResult<Self> {
        let sender_slot = match from.cmp(&to) {
            std::cmp::Ordering::Less => Slot::First,
            std::cmp::Ordering::Greater => Slot::Second,
            std::cmp::Ordering::Equal => {
                return Err(LedgerError::InvalidArgument(
                    "cannot transfer coins to yourself".to_string(),
                ));
            }
        };
        Ok(Self {
            from,
            to,
            sender_slot,
        })
    }

    pub fn from(&self) -> &Username {
        &self.from
    }

    pub fn to(&self) -> &Username {
        &self.to
    }

    pub fn sender_slot(&self) -> Slot {
        self.sender_slot
    }

    /// Accounts in the order their rows must be locked
    pub fn lock_order(&self) -> [&Username; 2] {
        match self.sender_slot {
            Slot::First => [&self.from, &self.to],
            Slot::Second => [&self.to, &self.from],
        }
    }
}

/// Balances of a locked pair, resolved to roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedBalances {
    pub sender: i64,
    pub receiver: i64,
}

/// Map rows returned by the ordered locking read back onto roles.
///
/// `rows` must be `(username, balance)` in canonical order. Fewer than two
/// rows means at least one account is missing.
pub fn resolve_locked_balances(
    pair: &AccountPair,
    rows: &[(String, i64)],
) -> LedgerResult<LockedBalances> {
    if rows.len() < 2 {
        return Err(LedgerError::AccountNotFound);
    }
    if rows.len() > 2 {
        return Err(LedgerError::Internal(format!(
            "pair lock returned {} rows",
            rows.len()
        )));
    }

    let expected = pair.lock_order();
    for (row, name) in rows.iter().zip(expected) {
        if row.0 != name.as_str() {
            return Err(LedgerError::Internal(format!(
                "pair lock returned rows out of order: {} where {} was expected",
                row.0, name
            )));
        }
    }

    let sender = pair.sender_slot().index();
    Ok(LockedBalances {
        sender: rows[sender].1,
        receiver: rows[1 - sender].1,
    })
}

/// Reject a debit the balance cannot cover
pub fn ensure_funds(balance: i64, cost: i64) -> LedgerResult<()> {
    if balance < cost {
        return Err(LedgerError::InsufficientFunds);
    }
    Ok(())
}

/// Balance after a purchase
pub fn debit(balance: i64, price: i64) -> LedgerResult<i64> {
    ensure_funds(balance, price)?;
    Ok(balance - price)
}

/// Balances after moving `amount` from sender to receiver
pub fn apply_transfer(balances: LockedBalances, amount: Amount) -> LedgerResult<LockedBalances> {
    let amount = amount.get();
    ensure_funds(balances.sender, amount)?;

    let receiver = balances
        .receiver
        .checked_add(amount)
        .ok_or_else(|| LedgerError::Internal("receiver balance overflow".to_string()))?;

    Ok(LockedBalances {
        sender: balances.sender - amount,
        receiver,
    })
}
