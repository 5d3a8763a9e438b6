//! Send Coin Use Case
//!
//! The ledger bounds its own unit of work; see `TransferLedger`.

use std::sync::Arc;

use crate::domain::entities::TransferRecord;
use crate::domain::repository::TransferLedger;
use crate::domain::services::AccountPair;
use crate::domain::value_objects::{Amount, Username};
use crate::error::LedgerResult;

#[derive(Debug, Clone)]
pub struct SendCoinInput {
    pub from_user: String,
    pub to_user: String,
    pub amount: i64,
}

pub struct SendCoinUseCase<L>
where
    L: TransferLedger,
{
    ledger: Arc<L>,
}

impl<L> SendCoinUseCase<L>
where
    L: TransferLedger,
{
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub async fn execute(&self, input: SendCoinInput) -> LedgerResult<TransferRecord> {
        let from = Username::new(input.from_user)?;
        let to = Username::new(input.to_user)?;
        let amount = Amount::new(input.amount)?;
        let pair = AccountPair::new(from, to)?;

        self.ledger.transfer(&pair, amount).await
    }
}
