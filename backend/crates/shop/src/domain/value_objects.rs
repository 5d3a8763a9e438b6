//! Domain Value Objects
//!
//! Validated inputs for the ledger. Constructing one of these is the only
//! way to reach storage, so an invalid argument never opens a transaction.

use std::fmt;

use crate::error::LedgerError;

/// Longest accepted username or item name, in characters
pub const MAX_NAME_LENGTH: usize = 64;

fn validate_name(field: &str, raw: &str) -> Result<(), LedgerError> {
    if raw.is_empty() {
        return Err(LedgerError::InvalidArgument(format!("{field} must not be empty")));
    }
    if raw.chars().count() > MAX_NAME_LENGTH {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if raw.chars().any(char::is_control) {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} contains control characters"
        )));
    }
    Ok(())
}

/// Account key. Compared byte-wise, the same order PostgreSQL uses under
/// `COLLATE "C"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Username(String);

impl Username {
    pub fn new(raw: impl Into<String>) -> Result<Self, LedgerError> {
        let raw = raw.into();
        validate_name("username", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemName(String);

impl ItemName {
    pub fn new(raw: impl Into<String>) -> Result<Self, LedgerError> {
        let raw = raw.into();
        validate_name("item", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strictly positive number of coins moved by a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn new(coins: i64) -> Result<Self, LedgerError> {
        if coins <= 0 {
            return Err(LedgerError::InvalidArgument(
                "amount must be positive".to_string(),
            ));
        }
        Ok(Self(coins))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
