//! Unit tests for the shop crate
//!
//! Ledger behaviour is exercised against `support::InMemoryShop`, which runs
//! the same domain rules as the PostgreSQL repository behind one async mutex.

#[cfg(test)]
mod support {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use chrono::Utc;
    use kernel::id::{PurchaseId, TransferId};
    use platform::password::HashedPassword;
    use tokio::sync::Mutex;

    use crate::domain::entities::{
        AccountCredentials, AccountLookup, CatalogItem, CoinHistory, CoinTransfer, InventoryItem,
        NewAccount, PurchaseRecord, TransferRecord,
    };
    use crate::domain::repository::{
        AccountRepository, HistoryProjection, PurchaseLedger, TransferLedger,
    };
    use crate::domain::services::{self, AccountPair};
    use crate::domain::value_objects::{Amount, ItemName, Username};
    use crate::error::{AuthError, AuthResult, LedgerError, LedgerResult};

    pub fn catalog() -> Vec<CatalogItem> {
        [
            ("t-shirt", 80),
            ("cup", 10),
            ("book", 50),
            ("pen", 10),
            ("powerbank", 200),
            ("hoody", 300),
            ("umbrella", 200),
            ("socks", 10),
            ("wallet", 50),
            ("pink-hoody", 500),
        ]
        .into_iter()
        .map(|(name, price)| CatalogItem {
            name: name.to_string(),
            price,
        })
        .collect()
    }

    struct StoredAccount {
        password_hash: Option<HashedPassword>,
        balance: i64,
    }

    #[derive(Default)]
    struct ShopState {
        accounts: HashMap<String, StoredAccount>,
        catalog: HashMap<String, i64>,
        purchases: Vec<(String, String)>,
        transfers: Vec<(String, String, i64)>,
    }

    #[derive(Clone, Default)]
    pub struct InMemoryShop {
        state: Arc<Mutex<ShopState>>,
    }

    impl InMemoryShop {
        pub fn new() -> Self {
            let shop = Self::default();
            {
                let mut state = shop.state.try_lock().unwrap();
                for item in catalog() {
                    state.catalog.insert(item.name, item.price);
                }
            }
            shop
        }

        pub fn with_account(self, username: &str, balance: i64) -> Self {
            self.state.try_lock().unwrap().accounts.insert(
                username.to_string(),
                StoredAccount {
                    password_hash: None,
                    balance,
                },
            );
            self
        }

        pub async fn balance(&self, username: &str) -> Option<i64> {
            self.state
                .lock()
                .await
                .accounts
                .get(username)
                .map(|a| a.balance)
        }

        pub async fn total_balance(&self) -> i64 {
            self.state
                .lock()
                .await
                .accounts
                .values()
                .map(|a| a.balance)
                .sum()
        }

        pub async fn record_counts(&self) -> (usize, usize) {
            let state = self.state.lock().await;
            (state.purchases.len(), state.transfers.len())
        }
    }

    impl AccountRepository for InMemoryShop {
        async fn find_credentials(&self, username: &Username) -> AuthResult<AccountLookup> {
            let state = self.state.lock().await;
            match state.accounts.get(username.as_str()) {
                Some(account) => {
                    let password_hash = account.password_hash.clone().ok_or_else(|| {
                        AuthError::Internal("seeded account has no password".to_string())
                    })?;
                    Ok(AccountLookup::Found(AccountCredentials {
                        username: username.clone(),
                        password_hash,
                    }))
                }
                None => Ok(AccountLookup::NotFound),
            }
        }

        async fn register(&self, account: &NewAccount) -> AuthResult<bool> {
            let mut state = self.state.lock().await;
            if state.accounts.contains_key(account.username.as_str()) {
                return Ok(false);
            }
            state.accounts.insert(
                account.username.as_str().to_string(),
                StoredAccount {
                    password_hash: Some(account.password_hash.clone()),
                    balance: account.balance,
                },
            );
            Ok(true)
        }
    }

    impl PurchaseLedger for InMemoryShop {
        async fn buy(&self, buyer: &Username, item: &ItemName) -> LedgerResult<PurchaseRecord> {
            let mut state = self.state.lock().await;

            let balance = state
                .accounts
                .get(buyer.as_str())
                .map(|a| a.balance)
                .ok_or(LedgerError::AccountNotFound)?;
            let price = *state
                .catalog
                .get(item.as_str())
                .ok_or(LedgerError::ItemNotFound)?;

            let remaining = services::debit(balance, price)?;

            if let Some(account) = state.accounts.get_mut(buyer.as_str()) {
                account.balance = remaining;
            }
            state
                .purchases
                .push((buyer.as_str().to_string(), item.as_str().to_string()));

            Ok(PurchaseRecord {
                id: PurchaseId::new(),
                username: buyer.clone(),
                item_name: item.clone(),
                price,
                purchased_at: Utc::now(),
            })
        }
    }

    impl TransferLedger for InMemoryShop {
        async fn transfer(
            &self,
            pair: &AccountPair,
            amount: Amount,
        ) -> LedgerResult<TransferRecord> {
            let mut state = self.state.lock().await;

            let rows: Vec<(String, i64)> = pair
                .lock_order()
                .iter()
                .filter_map(|name| {
                    state
                        .accounts
                        .get(name.as_str())
                        .map(|a| (name.as_str().to_string(), a.balance))
                })
                .collect();

            let balances = services::resolve_locked_balances(pair, &rows)?;
            let after = services::apply_transfer(balances, amount)?;

            if let Some(sender) = state.accounts.get_mut(pair.from().as_str()) {
                sender.balance = after.sender;
            }
            if let Some(receiver) = state.accounts.get_mut(pair.to().as_str()) {
                receiver.balance = after.receiver;
            }
            state.transfers.push((
                pair.from().as_str().to_string(),
                pair.to().as_str().to_string(),
                amount.get(),
            ));

            Ok(TransferRecord {
                id: TransferId::new(),
                from_user: pair.from().clone(),
                to_user: pair.to().clone(),
                amount,
                created_at: Utc::now(),
            })
        }
    }

    impl HistoryProjection for InMemoryShop {
        async fn inventory(&self, username: &Username) -> LedgerResult<Vec<InventoryItem>> {
            let state = self.state.lock().await;
            let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
            for (owner, item) in &state.purchases {
                if owner == username.as_str() {
                    *counts.entry(item.as_str()).or_default() += 1;
                }
            }
            Ok(counts
                .into_iter()
                .map(|(item_name, quantity)| InventoryItem {
                    item_name: item_name.to_string(),
                    quantity,
                })
                .collect())
        }

        async fn coin_history(&self, username: &Username) -> LedgerResult<CoinHistory> {
            let state = self.state.lock().await;
            let balance = state
                .accounts
                .get(username.as_str())
                .map(|a| a.balance)
                .ok_or(LedgerError::AccountNotFound)?;

            let mut received = Vec::new();
            let mut sent = Vec::new();
            for (from, to, amount) in state.transfers.iter().rev() {
                if to == username.as_str() {
                    received.push(CoinTransfer {
                        counterparty: from.clone(),
                        amount: *amount,
                    });
                }
                if from == username.as_str() {
                    sent.push(CoinTransfer {
                        counterparty: to.clone(),
                        amount: *amount,
                    });
                }
            }

            Ok(CoinHistory {
                balance,
                received,
                sent,
            })
        }
    }

    /// Projection whose reads never finish
    pub struct StallingProjection;

    impl HistoryProjection for StallingProjection {
        async fn inventory(&self, _username: &Username) -> LedgerResult<Vec<InventoryItem>> {
            std::future::pending().await
        }

        async fn coin_history(&self, _username: &Username) -> LedgerResult<CoinHistory> {
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod domain_tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use crate::domain::services::{
        AccountPair, apply_transfer, debit, resolve_locked_balances,
    };
    use crate::domain::value_objects::{Amount, Username};
    use crate::error::LedgerError;

    fn name(i: usize) -> Username {
        Username::new(format!("user{i}")).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn transfers_conserve_total_and_stay_non_negative(
            start in prop::collection::vec(0i64..10_000, 2..6),
            ops in prop::collection::vec((0usize..6, 0usize..6, -50i64..2_000), 0..80),
        ) {
            let mut balances: HashMap<Username, i64> = start
                .iter()
                .enumerate()
                .map(|(i, b)| (name(i), *b))
                .collect();
            let total: i64 = start.iter().sum();

            for (i, j, coins) in ops {
                let from = name(i % start.len());
                let to = name(j % start.len());

                let Ok(amount) = Amount::new(coins) else {
                    prop_assert!(coins <= 0);
                    continue;
                };
                let Ok(pair) = AccountPair::new(from.clone(), to.clone()) else {
                    prop_assert_eq!(&from, &to);
                    continue;
                };

                let rows: Vec<(String, i64)> = pair
                    .lock_order()
                    .iter()
                    .map(|n| (n.as_str().to_string(), balances[*n]))
                    .collect();
                let locked = resolve_locked_balances(&pair, &rows).unwrap();
                prop_assert_eq!(locked.sender, balances[&from]);

                match apply_transfer(locked, amount) {
                    Ok(after) => {
                        balances.insert(from, after.sender);
                        balances.insert(to, after.receiver);
                    }
                    Err(LedgerError::InsufficientFunds) => {
                        prop_assert!(balances[&from] < amount.get());
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                }
            }

            prop_assert_eq!(balances.values().sum::<i64>(), total);
            prop_assert!(balances.values().all(|b| *b >= 0));
        }

        #[test]
        fn purchases_never_overdraw(
            start in 0i64..2_000,
            prices in prop::collection::vec(1i64..600, 0..40),
        ) {
            let mut balance = start;
            let mut spent = 0;
            for price in prices {
                match debit(balance, price) {
                    Ok(rest) => {
                        spent += price;
                        balance = rest;
                    }
                    Err(LedgerError::InsufficientFunds) => prop_assert!(balance < price),
                    Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                }
                prop_assert!(balance >= 0);
            }
            prop_assert_eq!(balance + spent, start);
        }

        #[test]
        fn lock_order_is_canonical(a in "[a-zA-Z0-9_.-]{1,16}", b in "[a-zA-Z0-9_.-]{1,16}") {
            prop_assume!(a != b);
            let ua = Username::new(a.clone()).unwrap();
            let ub = Username::new(b.clone()).unwrap();

            let ab = AccountPair::new(ua.clone(), ub.clone()).unwrap();
            let ba = AccountPair::new(ub, ua).unwrap();

            prop_assert_eq!(ab.lock_order(), ba.lock_order());
            prop_assert!(ab.lock_order()[0].as_str().as_bytes() < ab.lock_order()[1].as_str().as_bytes());
            prop_assert_eq!(ab.lock_order()[ab.sender_slot().index()].as_str(), a.as_str());
            prop_assert_eq!(ba.lock_order()[ba.sender_slot().index()].as_str(), b.as_str());
        }
    }
}

#[cfg(test)]
mod use_case_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::future::join_all;

    use super::support::{InMemoryShop, StallingProjection};
    use crate::application::config::LedgerConfig;
    use crate::application::{BuyItemUseCase, GetInfoUseCase, SendCoinInput, SendCoinUseCase};
    use crate::domain::entities::{CoinTransfer, InventoryItem};
    use crate::error::LedgerError;

    fn ledger_config() -> Arc<LedgerConfig> {
        Arc::new(LedgerConfig::default())
    }

    fn send(from: &str, to: &str, amount: i64) -> SendCoinInput {
        SendCoinInput {
            from_user: from.to_string(),
            to_user: to.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_inventory_after_purchases() {
        let shop = Arc::new(InMemoryShop::new().with_account("alice", 1000));
        let buy = BuyItemUseCase::new(shop.clone());

        buy.execute("alice", "cup").await.unwrap();
        buy.execute("alice", "cup").await.unwrap();
        let record = buy.execute("alice", "hoody").await.unwrap();
        assert_eq!(record.price, 300);

        let info = GetInfoUseCase::new(shop.clone(), ledger_config())
            .execute("alice")
            .await
            .unwrap();

        assert_eq!(info.history.balance, 680);
        assert_eq!(
            info.inventory,
            vec![
                InventoryItem {
                    item_name: "cup".to_string(),
                    quantity: 2
                },
                InventoryItem {
                    item_name: "hoody".to_string(),
                    quantity: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_transfer_history_is_symmetric() {
        let shop = Arc::new(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 1000),
        );

        SendCoinUseCase::new(shop.clone())
            .execute(send("alice", "bob", 100))
            .await
            .unwrap();

        let info = GetInfoUseCase::new(shop.clone(), ledger_config());
        let alice = info.execute("alice").await.unwrap().history;
        let bob = info.execute("bob").await.unwrap().history;

        assert_eq!(alice.balance, 900);
        assert_eq!(bob.balance, 1100);
        assert_eq!(
            alice.sent,
            vec![CoinTransfer {
                counterparty: "bob".to_string(),
                amount: 100
            }]
        );
        assert!(alice.received.is_empty());
        assert_eq!(
            bob.received,
            vec![CoinTransfer {
                counterparty: "alice".to_string(),
                amount: 100
            }]
        );
        assert!(bob.sent.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let shop = Arc::new(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 1000),
        );
        let send_coin = SendCoinUseCase::new(shop.clone());
        send_coin.execute(send("alice", "bob", 1)).await.unwrap();
        send_coin.execute(send("alice", "bob", 2)).await.unwrap();

        let history = GetInfoUseCase::new(shop, ledger_config())
            .execute("bob")
            .await
            .unwrap()
            .history;
        let amounts: Vec<i64> = history.received.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_self_transfer_is_invalid() {
        let shop = Arc::new(InMemoryShop::new().with_account("alice", 1000));

        let result = SendCoinUseCase::new(shop.clone())
            .execute(send("alice", "alice", 10))
            .await;

        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert_eq!(shop.balance("alice").await, Some(1000));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_invalid() {
        let shop = Arc::new(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 1000),
        );
        let send_coin = SendCoinUseCase::new(shop.clone());

        for amount in [0, -1, -1000] {
            let result = send_coin.execute(send("alice", "bob", amount)).await;
            assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        }
        assert_eq!(shop.balance("alice").await, Some(1000));
        assert_eq!(shop.balance("bob").await, Some(1000));
    }

    #[tokio::test]
    async fn test_empty_arguments_are_invalid() {
        let shop = Arc::new(InMemoryShop::new().with_account("alice", 1000));

        let buy = BuyItemUseCase::new(shop.clone());
        assert!(matches!(
            buy.execute("alice", "").await,
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            buy.execute("", "cup").await,
            Err(LedgerError::InvalidArgument(_))
        ));

        let send_coin = SendCoinUseCase::new(shop.clone());
        assert!(matches!(
            send_coin.execute(send("alice", "", 5)).await,
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_failures_write_nothing() {
        let shop = Arc::new(
            InMemoryShop::new()
                .with_account("alice", 50)
                .with_account("bob", 0),
        );
        let buy = BuyItemUseCase::new(shop.clone());
        let send_coin = SendCoinUseCase::new(shop.clone());

        assert!(matches!(
            buy.execute("alice", "hoody").await,
            Err(LedgerError::InsufficientFunds)
        ));
        assert!(matches!(
            buy.execute("alice", "yacht").await,
            Err(LedgerError::ItemNotFound)
        ));
        assert!(matches!(
            buy.execute("carol", "cup").await,
            Err(LedgerError::AccountNotFound)
        ));
        assert!(matches!(
            send_coin.execute(send("alice", "bob", 51)).await,
            Err(LedgerError::InsufficientFunds)
        ));
        assert!(matches!(
            send_coin.execute(send("alice", "carol", 1)).await,
            Err(LedgerError::AccountNotFound)
        ));
        assert!(matches!(
            send_coin.execute(send("carol", "alice", 1)).await,
            Err(LedgerError::AccountNotFound)
        ));

        assert_eq!(shop.balance("alice").await, Some(50));
        assert_eq!(shop.balance("bob").await, Some(0));
        assert_eq!(shop.record_counts().await, (0, 0));
    }

    #[tokio::test]
    async fn test_transfer_of_entire_balance() {
        let shop = Arc::new(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 0),
        );

        SendCoinUseCase::new(shop.clone())
            .execute(send("alice", "bob", 1000))
            .await
            .unwrap();

        assert_eq!(shop.balance("alice").await, Some(0));
        assert_eq!(shop.balance("bob").await, Some(1000));
    }

    #[tokio::test]
    async fn test_info_for_unknown_account() {
        let shop = Arc::new(InMemoryShop::new());
        let result = GetInfoUseCase::new(shop, ledger_config())
            .execute("ghost")
            .await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound)));
    }

    #[tokio::test]
    async fn test_opposite_transfers_all_complete() {
        let shop = InMemoryShop::new()
            .with_account("alice", 1000)
            .with_account("bob", 1000);

        let tasks = (0..100).map(|i| {
            let shop = Arc::new(shop.clone());
            let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
            tokio::spawn(async move {
                SendCoinUseCase::new(shop)
                    .execute(send(from, to, 7))
                    .await
            })
        });

        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(shop.total_balance().await, 2000);
        assert_eq!(shop.balance("alice").await, Some(1000));
        assert_eq!(shop.record_counts().await, (0, 100));
    }

    #[tokio::test]
    async fn test_concurrent_spending_never_overdraws() {
        let shop = InMemoryShop::new()
            .with_account("alice", 100)
            .with_account("bob", 0);

        let tasks = (0..30).map(|i| {
            let shop = Arc::new(shop.clone());
            tokio::spawn(async move {
                if i % 3 == 0 {
                    BuyItemUseCase::new(shop)
                        .execute("alice", "cup")
                        .await
                        .map(|_| ())
                } else {
                    SendCoinUseCase::new(shop)
                        .execute(send("alice", "bob", 10))
                        .await
                        .map(|_| ())
                }
            })
        });

        let outcomes: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 10);
        assert!(
            outcomes
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, LedgerError::InsufficientFunds))
        );
        assert_eq!(shop.balance("alice").await, Some(0));
    }

    #[tokio::test]
    async fn test_info_read_deadline() {
        let config = Arc::new(LedgerConfig {
            lock_timeout: Duration::from_millis(10),
            unit_of_work_timeout: Duration::from_millis(20),
        });

        let result = GetInfoUseCase::new(Arc::new(StallingProjection), config)
            .execute("alice")
            .await;

        assert!(matches!(result, Err(LedgerError::Internal(_))));
    }
}

#[cfg(test)]
mod auth_tests {
    use std::sync::Arc;

    use platform::token::{TokenConfig, TokenIssuer};

    use super::support::InMemoryShop;
    use crate::application::config::ShopConfig;
    use crate::application::{AuthenticateInput, AuthenticateUseCase};
    use crate::domain::repository::AccountRepository;
    use crate::domain::value_objects::Username;
    use crate::domain::entities::AccountLookup;
    use crate::error::AuthError;

    fn tokens() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(&TokenConfig::new(
            "auth-test-secret",
            chrono::Duration::hours(1),
        )))
    }

    fn input(username: &str, password: &str) -> AuthenticateInput {
        AuthenticateInput {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_sign_in_registers_with_starting_balance() {
        let shop = Arc::new(InMemoryShop::new());
        let tokens = tokens();
        let use_case =
            AuthenticateUseCase::new(shop.clone(), tokens.clone(), Arc::new(ShopConfig::default()));

        let output = use_case.execute(input("alice", "s3cret")).await.unwrap();
        assert!(output.registered);
        assert_eq!(tokens.verify(&output.token).unwrap().sub, "alice");
        assert_eq!(shop.balance("alice").await, Some(1000));

        let again = use_case.execute(input("alice", "s3cret")).await.unwrap();
        assert!(!again.registered);
        assert_eq!(shop.balance("alice").await, Some(1000));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let shop = Arc::new(InMemoryShop::new());
        let use_case =
            AuthenticateUseCase::new(shop.clone(), tokens(), Arc::new(ShopConfig::default()));

        use_case.execute(input("alice", "right")).await.unwrap();
        let result = use_case.execute(input("alice", "wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_empty_credentials_are_invalid() {
        let shop = Arc::new(InMemoryShop::new());
        let use_case =
            AuthenticateUseCase::new(shop.clone(), tokens(), Arc::new(ShopConfig::default()));

        assert!(matches!(
            use_case.execute(input("", "pw")).await,
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            use_case.execute(input("alice", "")).await,
            Err(AuthError::InvalidArgument(_))
        ));

        let lookup = shop
            .find_credentials(&Username::new("alice").unwrap())
            .await
            .unwrap();
        assert!(matches!(lookup, AccountLookup::NotFound));
    }
}

#[cfg(test)]
mod handler_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use platform::token::{TokenConfig, TokenIssuer};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::support::InMemoryShop;
    use crate::application::config::ShopConfig;
    use crate::presentation::router::shop_router_generic;

    const SECRET: &str = "handler-test-secret";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig::new(SECRET, chrono::Duration::hours(1)))
    }

    fn app(shop: InMemoryShop) -> Router {
        Router::new().nest(
            "/api",
            shop_router_generic(shop, ShopConfig::development(), issuer()),
        )
    }

    fn bearer(username: &str) -> String {
        format!("Bearer {}", issuer().issue(username).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = app(InMemoryShop::new().with_account("alice", 1000));

        for uri in ["/api/info", "/api/buy/cup"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(body_json(response).await["errors"].is_string());
        }
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let forged = TokenIssuer::new(&TokenConfig::new("other", chrono::Duration::hours(1)))
            .issue("alice")
            .unwrap();

        let response = app(InMemoryShop::new().with_account("alice", 1000))
            .oneshot(
                Request::builder()
                    .uri("/api/info")
                    .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_buy_then_info() {
        let app = app(InMemoryShop::new().with_account("alice", 1000));

        for item in ["cup", "cup", "hoody"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/buy/{item}"))
                        .header(header::AUTHORIZATION, bearer("alice"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/info")
                    .header(header::AUTHORIZATION, bearer("alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["coins"], 680);
        assert_eq!(
            body["inventory"],
            serde_json::json!([
                {"type": "cup", "quantity": 2},
                {"type": "hoody", "quantity": 1}
            ])
        );
        assert_eq!(
            body["coinHistory"],
            serde_json::json!({"received": [], "sent": []})
        );
    }

    #[tokio::test]
    async fn test_buy_unknown_item() {
        let response = app(InMemoryShop::new().with_account("alice", 1000))
            .oneshot(
                Request::builder()
                    .uri("/api/buy/yacht")
                    .header(header::AUTHORIZATION, bearer("alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errors"], "item not found");
    }

    #[tokio::test]
    async fn test_send_coin_and_history_shape() {
        let app = app(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 1000),
        );

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sendCoin")
                    .header(header::AUTHORIZATION, bearer("alice"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"toUser":"bob","amount":100}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/info")
                    .header(header::AUTHORIZATION, bearer("bob"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["coins"], 1100);
        assert_eq!(
            body["coinHistory"]["received"],
            serde_json::json!([{"fromUser": "alice", "amount": 100}])
        );
    }

    #[tokio::test]
    async fn test_send_coin_rejections() {
        let app = app(
            InMemoryShop::new()
                .with_account("alice", 1000)
                .with_account("bob", 1000),
        );

        let bodies = [
            r#"{"toUser":"alice","amount":10}"#,
            r#"{"toUser":"bob","amount":0}"#,
            r#"{"toUser":"bob","amount":5000}"#,
            r#"{"toUser":"carol","amount":1}"#,
            r#"{"toUser":"bob"}"#,
            r#"not json"#,
        ];

        for body in bodies {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/sendCoin")
                        .header(header::AUTHORIZATION, bearer("alice"))
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(body_json(response).await["errors"].is_string());
        }
    }

    #[tokio::test]
    async fn test_auth_endpoint_sets_token_and_cookie() {
        let app = app(InMemoryShop::new());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"dave","password":"pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("access_token="));

        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(issuer().verify(&token).unwrap().sub, "dave");

        // the cookie alone authenticates
        let cookie_pair = cookie.split(';').next().unwrap().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/info")
                    .header(header::COOKIE, cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["coins"], 1000);
    }

    #[tokio::test]
    async fn test_auth_endpoint_rejects_empty_username() {
        let response = app(InMemoryShop::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"","password":"pw"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod error_tests {
    use kernel::error::kind::ErrorKind;

    use crate::error::{AuthError, LedgerError};

    #[test]
    fn test_ledger_error_kinds() {
        assert_eq!(
            LedgerError::InvalidArgument("x".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(LedgerError::AccountNotFound.status_code(), 400);
        assert_eq!(LedgerError::ItemNotFound.status_code(), 400);
        assert_eq!(LedgerError::InsufficientFunds.status_code(), 400);
        assert_eq!(LedgerError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_auth_error_kinds() {
        assert_eq!(AuthError::InvalidArgument("x".into()).status_code(), 400);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::MissingToken.status_code(), 401);
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::InvalidToken.status_code(), 401);
        assert_eq!(AuthError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_description_is_not_exposed() {
        let err = LedgerError::Internal("relation \"accounts\" does not exist".into());
        let app_err = err.to_app_error();
        assert_eq!(app_err.message(), "internal failure");

        let err = AuthError::Internal("pool exhausted".into());
        assert_eq!(err.to_app_error().message(), "internal failure");
    }

    #[test]
    fn test_domain_messages_are_exposed() {
        assert_eq!(
            LedgerError::InsufficientFunds.to_app_error().message(),
            "insufficient funds"
        );
    }

    #[test]
    fn test_sqlx_error_becomes_internal() {
        let err: LedgerError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, LedgerError::Internal(_)));

        let err: AuthError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_client_class_storage_error_is_still_internal() {
        let err: LedgerError = sqlx::Error::RowNotFound.into();
        match err {
            LedgerError::Internal(description) => assert_eq!(description, "Record not found"),
            other => panic!("expected Internal, got {other:?}"),
        }

        let err: AuthError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 500);
    }
}

#[cfg(test)]
mod config_tests {
    use std::time::Duration;

    use crate::application::config::{LedgerConfig, SameSite, ShopConfig};

    #[test]
    fn test_defaults() {
        let config = ShopConfig::default();
        assert_eq!(config.starting_balance, 1000);
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert!(config.cookie_secure);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
        assert_eq!(config.ledger.lock_timeout_ms(), 2000);
        assert_eq!(
            LedgerConfig::default().unit_of_work_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_development_cookie() {
        let cookie = ShopConfig::development().cookie_config();
        assert!(!cookie.secure);
        assert_eq!(cookie.name, "access_token");
        assert_eq!(cookie.max_age_secs, Some(86_400));
    }

    #[test]
    fn test_cookie_max_age_saturates() {
        let config = ShopConfig {
            token_ttl: Duration::from_secs(u64::MAX),
            ..ShopConfig::default()
        };
        assert_eq!(config.cookie_config().max_age_secs, Some(i64::MAX));
    }
}
