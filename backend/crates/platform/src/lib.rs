//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the shop service:
//! - Password hashing (Argon2id)
//! - Access token issuance and verification (HS256 JWT)
//! - Credential extraction from `Authorization` headers and cookies

pub mod cookie;
pub mod password;
pub mod token;
