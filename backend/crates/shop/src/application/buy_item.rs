//! Buy Item Use Case
//!
//! The ledger bounds its own unit of work; see `PurchaseLedger`.

use std::sync::Arc;

use crate::domain::entities::PurchaseRecord;
use crate::domain::repository::PurchaseLedger;
use crate::domain::value_objects::{ItemName, Username};
use crate::error::LedgerResult;

pub struct BuyItemUseCase<L>
where
    L: PurchaseLedger,
{
    ledger: Arc<L>,
}

impl<L> BuyItemUseCase<L>
where
    L: PurchaseLedger,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub async fn execute(&self, buyer: &str, item: &str) -> LedgerResult<PurchaseRecord> {
        let buyer = Username::new(buyer)?;
        let item = ItemName::new(item)?;

        self.ledger.buy(&buyer, &item).await
    }
}
