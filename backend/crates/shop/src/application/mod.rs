//! Application Layer - Use Cases
//!
//! Validates caller input, then drives the domain through the repository
//! traits. Read-only projections are bounded here by
//! `LedgerConfig::unit_of_work_timeout`; ledger writes are bounded inside the
//! storage backend, which must not cancel an in-flight commit.

pub mod authenticate;
pub mod buy_item;
pub mod config;
pub mod get_info;
pub mod send_coin;

pub use authenticate::{AuthenticateInput, AuthenticateOutput, AuthenticateUseCase};
pub use buy_item::BuyItemUseCase;
pub use get_info::{GetInfoUseCase, InfoOutput};
pub use send_coin::{SendCoinInput, SendCoinUseCase};

use std::future::Future;
use std::time::Duration;

use crate::error::{LedgerError, LedgerResult};

/// Run a unit of work under a deadline. On expiry the future is dropped,
/// which drops its open transaction and rolls it back. Never wrap a commit.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, work: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    match tokio::time::timeout(deadline, work).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Internal(format!(
            "unit of work exceeded {} ms",
            deadline.as_millis()
        ))),
    }
}
