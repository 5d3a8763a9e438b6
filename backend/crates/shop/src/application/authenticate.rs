//! Authenticate Use Case
//!
//! Sign in, registering the account on first use.

use std::sync::Arc;

use platform::password::ClearTextPassword;
use platform::token::TokenIssuer;

use crate::application::config::ShopConfig;
use crate::domain::entities::{AccountLookup, NewAccount};
use crate::domain::repository::AccountRepository;
use crate::domain::value_objects::Username;
use crate::error::{AuthError, AuthResult, LedgerError};

pub struct AuthenticateInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug)]
pub struct AuthenticateOutput {
    pub token: String,
    pub username: Username,
    /// `true` when this call created the account
    pub registered: bool,
}

pub struct AuthenticateUseCase<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenIssuer>,
    config: Arc<ShopConfig>,
}

impl<R> AuthenticateUseCase<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenIssuer>, config: Arc<ShopConfig>) -> Self {
        Self {
            repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: AuthenticateInput) -> AuthResult<AuthenticateOutput> {
        let username = Username::new(input.username).map_err(invalid_argument)?;
        let password = ClearTextPassword::new(input.password)?;

        let registered = match self.repo.find_credentials(&username).await? {
            AccountLookup::Found(credentials) => {
                if !credentials.password_hash.verify(&password) {
                    return Err(AuthError::InvalidCredentials);
                }
                false
            }
            AccountLookup::NotFound => self.register(&username, &password).await?,
        };

        let token = self.tokens.issue(username.as_str())?;

        tracing::info!(username = %username, registered, "Signed in");

        Ok(AuthenticateOutput {
            token,
            username,
            registered,
        })
    }

    /// Create the account. If a concurrent request created it first, fall
    /// back to verifying against the stored hash.
    async fn register(&self, username: &Username, password: &ClearTextPassword) -> AuthResult<bool> {
        let account = NewAccount {
            username: username.clone(),
            password_hash: password.hash()?,
            balance: self.config.starting_balance,
        };

        if self.repo.register(&account).await? {
            tracing::info!(
                username = %username,
                balance = account.balance,
                "Account registered"
            );
            return Ok(true);
        }

        tracing::debug!(username = %username, "Lost registration race, verifying instead");
        match self.repo.find_credentials(username).await? {
            AccountLookup::Found(credentials) if credentials.password_hash.verify(password) => {
                Ok(false)
            }
            AccountLookup::Found(_) => Err(AuthError::InvalidCredentials),
            AccountLookup::NotFound => Err(AuthError::Internal(
                "account vanished after conflicting insert".to_string(),
            )),
        }
    }
}

fn invalid_argument(err: LedgerError) -> AuthError {
    match err {
        LedgerError::InvalidArgument(reason) => AuthError::InvalidArgument(reason),
        other => AuthError::Internal(other.to_string()),
    }
}
