//! Coin Shop Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, ledger rules, repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Ledger Model
//! - All shared state lives in PostgreSQL; coordination is row locks only
//! - A transfer locks both accounts in one query, ordered by username bytes
//! - Balances change by relative updates under the lock, never by write-back
//! - Domain rejections roll back and write nothing

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{LedgerConfig, ShopConfig};
pub use error::{AuthError, AuthResult, LedgerError, LedgerResult};
pub use infra::postgres::PgShopRepository;
pub use presentation::router::{shop_router, shop_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

#[cfg(test)]
mod tests;
