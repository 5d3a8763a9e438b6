//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (accounts, purchase and transfer records, projections)
//! - Domain value objects (Username, ItemName, Amount)
//! - Domain services (canonical lock order, ledger rules)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
