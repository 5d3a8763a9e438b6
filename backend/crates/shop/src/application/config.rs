//! Application Configuration

use std::time::Duration;

use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Bounds on a single ledger unit of work
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Server-side `lock_timeout` for row locks taken by the ledgers
    pub lock_timeout: Duration,
    /// Deadline for the whole unit of work, lock waits included
    pub unit_of_work_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
            unit_of_work_timeout: Duration::from_millis(5000),
        }
    }
}

impl LedgerConfig {
    pub fn lock_timeout_ms(&self) -> u128 {
        self.lock_timeout.as_millis()
    }
}

/// Shop application configuration
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Coins granted to an account on registration
    pub starting_balance: i64,
    /// Lifetime of issued access tokens (and of the cookie carrying them)
    pub token_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub ledger: LedgerConfig,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            token_ttl: Duration::from_secs(24 * 60 * 60),
            cookie_name: platform::cookie::ACCESS_TOKEN_COOKIE.to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            ledger: LedgerConfig::default(),
        }
    }
}

impl ShopConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: self.cookie_name.clone(),
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            ..CookieConfig::default()
        }
        .with_max_age(i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX))
    }
}
