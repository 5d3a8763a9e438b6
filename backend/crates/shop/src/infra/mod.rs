//! Infrastructure Layer - storage implementations of the repository traits

pub mod postgres;
