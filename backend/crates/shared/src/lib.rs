//! Shared Kernel - vocabulary shared by every crate of the coin shop
//!
//! This crate contains the "smallest core" of the service:
//! - The unified error type ([`error::app_error::AppError`]) and its HTTP classification
//! - Typed identifiers for append-only ledger records
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
