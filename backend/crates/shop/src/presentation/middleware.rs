//! Auth Middleware
//!
//! Verifies the access token on protected routes and hands the caller's
//! identity to handlers through request extensions.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::token::TokenIssuer;

use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub tokens: Arc<TokenIssuer>,
    pub cookie_name: String,
}

/// Identity of the caller, derived from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Middleware that requires a valid access token (bearer header or cookie)
pub async fn require_auth(
    State(state): State<AuthMiddlewareState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = platform::cookie::extract_access_token(req.headers(), &state.cookie_name)
        .ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify(&token)?;

    req.extensions_mut().insert(AuthenticatedUser {
        username: claims.sub,
    });

    Ok(next.run(req).await)
}
