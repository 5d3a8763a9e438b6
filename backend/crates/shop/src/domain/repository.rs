//! Repository Traits
//!
//! Interfaces for persistence. Each ledger method is one atomic unit of work:
//! it either commits completely or leaves storage untouched. Ledgers enforce
//! the unit-of-work deadline themselves, on the work before commit only, so an
//! `Internal` error always means nothing was written.

use crate::domain::entities::{
    AccountLookup, CoinHistory, InventoryItem, NewAccount, PurchaseRecord, TransferRecord,
};
use crate::domain::services::AccountPair;
use crate::domain::value_objects::{Amount, ItemName, Username};
use crate::error::{AuthResult, LedgerResult};

/// Account credentials for the sign-in flow
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn find_credentials(&self, username: &Username) -> AuthResult<AccountLookup>;

    /// Insert unless the name is taken. `false` means another request
    /// registered the same name first.
    async fn register(&self, account: &NewAccount) -> AuthResult<bool>;
}

/// Debit a buyer by an item's price and record the purchase
#[trait_variant::make(PurchaseLedger: Send)]
pub trait LocalPurchaseLedger {
    async fn buy(&self, buyer: &Username, item: &ItemName) -> LedgerResult<PurchaseRecord>;
}

/// Move coins between two accounts and record the transfer
#[trait_variant::make(TransferLedger: Send)]
pub trait LocalTransferLedger {
    async fn transfer(&self, pair: &AccountPair, amount: Amount) -> LedgerResult<TransferRecord>;
}

/// Read-only views over the ledgers. Takes no row locks.
#[trait_variant::make(HistoryProjection: Send)]
pub trait LocalHistoryProjection {
    /// Units owned per item. Empty when nothing was bought.
    async fn inventory(&self, username: &Username) -> LedgerResult<Vec<InventoryItem>>;

    /// Balance and transfer history from one snapshot
    async fn coin_history(&self, username: &Username) -> LedgerResult<CoinHistory>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait ShopRepository:
    AccountRepository + PurchaseLedger + TransferLedger + HistoryProjection + Clone + Send + Sync + 'static
{
}

impl<T> ShopRepository for T where
    T: AccountRepository
        + PurchaseLedger
        + TransferLedger
        + HistoryProjection
        + Clone
        + Send
        + Sync
        + 'static
{
}
