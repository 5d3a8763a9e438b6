//! Process configuration read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use shop::{LedgerConfig, ShopConfig};

const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// One year
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_port: u16,
    /// `None` only in debug builds, where a random secret is generated.
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: u64,
    pub ledger_lock_timeout: Duration,
    pub ledger_timeout: Duration,
    pub starting_balance: i64,
    pub frontend_origins: Vec<String>,
    pub shutdown_grace: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        if jwt_secret.is_none() && !cfg!(debug_assertions) {
            bail!("JWT_SECRET must be set in production");
        }

        let starting_balance: i64 = parse_or("STARTING_BALANCE", 1000)?;
        if starting_balance < 0 {
            bail!("STARTING_BALANCE must not be negative");
        }

        let token_ttl_hours = check_token_ttl_hours(parse_or("TOKEN_TTL_HOURS", 24)?)?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            http_port: parse_or("HTTP_PORT", 8080)?,
            jwt_secret,
            token_ttl_hours,
            ledger_lock_timeout: Duration::from_millis(parse_or("LEDGER_LOCK_TIMEOUT_MS", 2000)?),
            ledger_timeout: Duration::from_millis(parse_or("LEDGER_TIMEOUT_MS", 5000)?),
            starting_balance,
            frontend_origins,
            shutdown_grace: Duration::from_secs(parse_or("SHUTDOWN_GRACE_SECS", 30)?),
        })
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours * 60 * 60)
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            lock_timeout: self.ledger_lock_timeout,
            unit_of_work_timeout: self.ledger_timeout,
        }
    }

    /// Insecure cookies in debug builds so the shop works over plain HTTP.
    pub fn shop_config(&self) -> ShopConfig {
        let base = if cfg!(debug_assertions) {
            ShopConfig::development()
        } else {
            ShopConfig::default()
        };

        ShopConfig {
            starting_balance: self.starting_balance,
            token_ttl: self.token_ttl(),
            ledger: self.ledger_config(),
            ..base
        }
    }
}

fn check_token_ttl_hours(hours: u64) -> anyhow::Result<u64> {
    if hours == 0 || hours > MAX_TOKEN_TTL_HOURS {
        bail!("TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}");
    }
    Ok(hours)
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(check_token_ttl_hours(24).unwrap(), 24);
        assert_eq!(
            check_token_ttl_hours(MAX_TOKEN_TTL_HOURS).unwrap(),
            MAX_TOKEN_TTL_HOURS
        );
        assert!(check_token_ttl_hours(0).is_err());
        assert!(check_token_ttl_hours(MAX_TOKEN_TTL_HOURS + 1).is_err());
        assert!(check_token_ttl_hours(u64::MAX).is_err());
    }
}
