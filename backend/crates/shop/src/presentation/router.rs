//! Shop Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::token::TokenIssuer;

use crate::application::config::ShopConfig;
use crate::domain::repository::ShopRepository;
use crate::infra::postgres::PgShopRepository;
use crate::presentation::handlers::{self, ShopAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_auth};

/// Create the shop router with PostgreSQL repository
pub fn shop_router(repo: PgShopRepository, config: ShopConfig, tokens: TokenIssuer) -> Router {
    shop_router_generic(repo, config, tokens)
}

/// Create a generic shop router for any repository implementation
///
/// `/auth` is public; every other route needs a valid access token.
pub fn shop_router_generic<R>(repo: R, config: ShopConfig, tokens: TokenIssuer) -> Router
where
    R: ShopRepository,
{
    let tokens = Arc::new(tokens);

    let auth_state = AuthMiddlewareState {
        tokens: tokens.clone(),
        cookie_name: config.cookie_name.clone(),
    };

    let state = ShopAppState {
        repo: Arc::new(repo),
        ledger: Arc::new(config.ledger.clone()),
        config: Arc::new(config),
        tokens,
    };

    let protected = Router::new()
        .route("/buy/{item}", get(handlers::buy_item::<R>))
        .route("/sendCoin", post(handlers::send_coin::<R>))
        .route("/info", get(handlers::get_info::<R>))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/auth", post(handlers::authenticate::<R>))
        .merge(protected)
        .with_state(state)
}
