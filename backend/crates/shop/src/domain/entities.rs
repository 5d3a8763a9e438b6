//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{PurchaseId, TransferId};
use platform::password::HashedPassword;

use crate::domain::value_objects::{Amount, ItemName, Username};

/// Stored sign-in material for an account
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub username: Username,
    pub password_hash: HashedPassword,
}

/// Result of looking an account up by name during sign-in.
///
/// `NotFound` is not an error: it is the branch that registers the account.
#[derive(Debug, Clone)]
pub enum AccountLookup {
    Found(AccountCredentials),
    NotFound,
}

/// Account about to be created on first sign-in
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub password_hash: HashedPassword,
    pub balance: i64,
}

/// Priced catalog entry. Reference data, never mutated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub name: String,
    pub price: i64,
}

/// One unit bought by one account
#[derive(Debug, Clone)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub username: Username,
    pub item_name: ItemName,
    pub price: i64,
    pub purchased_at: DateTime<Utc>,
}

/// One committed movement of coins between two accounts
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub id: TransferId,
    pub from_user: Username,
    pub to_user: Username,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

/// Inventory line: how many units of an item an account owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub item_name: String,
    pub quantity: i64,
}

/// One side of a transfer as seen from the account being projected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinTransfer {
    pub counterparty: String,
    pub amount: i64,
}

/// Balance plus transfer history, newest first, read from one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinHistory {
    pub balance: i64,
    pub received: Vec<CoinTransfer>,
    pub sent: Vec<CoinTransfer>,
}
