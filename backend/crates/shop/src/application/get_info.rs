//! Get Info Use Case
//!
//! Balance, inventory and coin history for the signed-in account.

use std::sync::Arc;

use crate::application::config::LedgerConfig;
use crate::application::with_deadline;
use crate::domain::entities::{CoinHistory, InventoryItem};
use crate::domain::repository::HistoryProjection;
use crate::domain::value_objects::Username;
use crate::error::LedgerResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoOutput {
    pub inventory: Vec<InventoryItem>,
    pub history: CoinHistory,
}

pub struct GetInfoUseCase<P>
where
    P: HistoryProjection,
{
    projection: Arc<P>,
    config: Arc<LedgerConfig>,
}

impl<P> GetInfoUseCase<P>
where
    P: HistoryProjection,
{
    pub fn new(projection: Arc<P>, config: Arc<LedgerConfig>) -> Self {
        Self { projection, config }
    }

    pub async fn execute(&self, username: &str) -> LedgerResult<InfoOutput> {
        let username = Username::new(username)?;

        // History first: it is the call that reports a missing account.
        let history = with_deadline(
            self.config.unit_of_work_timeout,
            self.projection.coin_history(&username),
        )
        .await?;
        let inventory = with_deadline(
            self.config.unit_of_work_timeout,
            self.projection.inventory(&username),
        )
        .await?;

        Ok(InfoOutput { inventory, history })
    }
}
