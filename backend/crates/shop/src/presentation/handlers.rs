//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use platform::token::TokenIssuer;

use crate::application::config::{LedgerConfig, ShopConfig};
use crate::application::{
    AuthenticateInput, AuthenticateUseCase, BuyItemUseCase, GetInfoUseCase, SendCoinInput,
    SendCoinUseCase,
};
use crate::domain::repository::ShopRepository;
use crate::error::{AuthError, AuthResult, LedgerError, LedgerResult};
use crate::presentation::dto::{AuthRequest, AuthResponse, InfoResponse, SendCoinRequest};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for shop handlers
#[derive(Clone)]
pub struct ShopAppState<R>
where
    R: ShopRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<ShopConfig>,
    pub ledger: Arc<LedgerConfig>,
    pub tokens: Arc<TokenIssuer>,
}

/// POST /api/auth
pub async fn authenticate<R>(
    State(state): State<ShopAppState<R>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse>
where
    R: ShopRepository,
{
    let Json(req) = payload.map_err(|e| AuthError::InvalidArgument(e.body_text()))?;

    let use_case =
        AuthenticateUseCase::new(state.repo.clone(), state.tokens.clone(), state.config.clone());

    let output = use_case
        .execute(AuthenticateInput {
            username: req.username,
            password: req.password,
        })
        .await?;

    let cookie = platform::cookie::set_cookie_header(&state.config.cookie_config(), &output.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            token: output.token,
        }),
    ))
}

/// GET /api/buy/{item}
pub async fn buy_item<R>(
    State(state): State<ShopAppState<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(item): Path<String>,
) -> LedgerResult<StatusCode>
where
    R: ShopRepository,
{
    let use_case = BuyItemUseCase::new(state.repo.clone());
    use_case.execute(&user.username, &item).await?;
    Ok(StatusCode::OK)
}

/// POST /api/sendCoin
pub async fn send_coin<R>(
    State(state): State<ShopAppState<R>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<SendCoinRequest>, JsonRejection>,
) -> LedgerResult<StatusCode>
where
    R: ShopRepository,
{
    let Json(req) = payload.map_err(|e| LedgerError::InvalidArgument(e.body_text()))?;

    let use_case = SendCoinUseCase::new(state.repo.clone());
    use_case
        .execute(SendCoinInput {
            from_user: user.username,
            to_user: req.to_user,
            amount: req.amount,
        })
        .await?;

    Ok(StatusCode::OK)
}

/// GET /api/info
pub async fn get_info<R>(
    State(state): State<ShopAppState<R>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> LedgerResult<Json<InfoResponse>>
where
    R: ShopRepository,
{
    let use_case = GetInfoUseCase::new(state.repo.clone(), state.ledger.clone());
    let info = use_case.execute(&user.username).await?;
    Ok(Json(info.into()))
}
