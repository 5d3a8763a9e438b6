//! Shop Error Types
//!
//! Two closed enums: [`LedgerError`] for balance-touching operations and
//! projections, [`AuthError`] for sign-in and token checks. Both convert into
//! `kernel::error::AppError` at the HTTP edge.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use platform::token::TokenError;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;
pub type AuthResult<T> = Result<T, AuthError>;

/// Outcome of a rejected ledger operation.
///
/// Every variant except `Internal` is a domain outcome: the unit of work was
/// rolled back (or never opened) and nothing was written.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("account not found")]
    AccountNotFound,

    #[error("item not found")]
    ItemNotFound,

    #[error("insufficient funds")]
    InsufficientFunds,

    /// Storage fault, deadline or broken invariant. The description is for
    /// logs only and is never rendered to clients.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidArgument(_)
            | LedgerError::AccountNotFound
            | LedgerError::ItemNotFound
            | LedgerError::InsufficientFunds => ErrorKind::BadRequest,
            LedgerError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            LedgerError::Internal(_) => AppError::internal("internal failure"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            LedgerError::Internal(description) => {
                tracing::error!(description = %description, "Ledger internal failure");
            }
            LedgerError::InsufficientFunds => {
                tracing::warn!("Ledger rejected: insufficient funds");
            }
            LedgerError::AccountNotFound | LedgerError::ItemNotFound => {
                tracing::warn!(error = %self, "Ledger rejected: unknown reference");
            }
            LedgerError::InvalidArgument(_) => {
                tracing::debug!(error = %self, "Ledger rejected request");
            }
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        let classified = AppError::from(err);
        if classified.kind().is_server_error() {
            tracing::error!(
                error = ?classified,
                kind = %classified.kind(),
                "Ledger storage error"
            );
        } else {
            tracing::warn!(
                error = ?classified,
                kind = %classified.kind(),
                "Ledger storage conflict"
            );
        }
        LedgerError::Internal(classified.message().to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Sign-in and token failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing access token")]
    MissingToken,

    #[error("access token expired")]
    TokenExpired,

    #[error("invalid access token")]
    InvalidToken,

    #[error("internal failure: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidArgument(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::InvalidToken => ErrorKind::Unauthorized,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Internal(_) => AppError::internal("internal failure"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Internal(description) => {
                tracing::error!(description = %description, "Auth internal failure");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Rejected forged or malformed access token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        let classified = AppError::from(err);
        if classified.kind().is_server_error() {
            tracing::error!(
                error = ?classified,
                kind = %classified.kind(),
                "Auth storage error"
            );
        } else {
            tracing::warn!(
                error = ?classified,
                kind = %classified.kind(),
                "Auth storage conflict"
            );
        }
        AuthError::Internal(classified.message().to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::InvalidArgument(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
