//! PostgreSQL Repository Implementations
//!
//! Every ledger method runs in one transaction. Balances change only through
//! relative `UPDATE`s issued while the affected rows are held `FOR UPDATE`.
//! Returning early with `?` drops the transaction, which rolls it back.
//! Ledger writes run under `LedgerConfig::unit_of_work_timeout` up to, but not
//! including, COMMIT.

use chrono::{DateTime, Utc};
use kernel::id::{PurchaseId, TransferId};
use platform::password::HashedPassword;
use sqlx::{PgPool, Postgres, Transaction};

use crate::application::config::LedgerConfig;
use crate::application::with_deadline;
use crate::domain::entities::{
    AccountCredentials, AccountLookup, CoinHistory, CoinTransfer, InventoryItem, NewAccount,
    PurchaseRecord, TransferRecord,
};
use crate::domain::repository::{
    AccountRepository, HistoryProjection, PurchaseLedger, TransferLedger,
};
use crate::domain::services::{self, AccountPair};
use crate::domain::value_objects::{Amount, ItemName, Username};
use crate::error::{AuthError, AuthResult, LedgerError, LedgerResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgShopRepository {
    pool: PgPool,
    config: LedgerConfig,
}

impl PgShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, LedgerConfig::default())
    }

    pub fn with_config(pool: PgPool, config: LedgerConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a read-write unit of work with the configured `lock_timeout`.
    async fn begin_ledger_tx(&self) -> LedgerResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.config.lock_timeout_ms()))
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    /// Open a read-only snapshot. Must be the first statement of the transaction.
    async fn begin_snapshot_tx(&self) -> LedgerResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }
}

// ============================================================================
// Account store
// ============================================================================

/// Exclusive lock on one account row. `None` when the account does not exist.
async fn lock_account(
    tx: &mut Transaction<'static, Postgres>,
    username: &Username,
) -> LedgerResult<Option<i64>> {
    let balance = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT balance
        FROM accounts
        WHERE username = $1
        FOR UPDATE
        "#,
    )
    .bind(username.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(balance)
}

/// Lock both rows of a pair with a single ordered query.
async fn lock_pair(
    tx: &mut Transaction<'static, Postgres>,
    pair: &AccountPair,
) -> LedgerResult<Vec<(String, i64)>> {
    let names: Vec<String> = pair
        .lock_order()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();

    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT username, balance
        FROM accounts
        WHERE username = ANY($1)
        ORDER BY username COLLATE "C"
        FOR UPDATE
        "#,
    )
    .bind(names)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// Relative balance change on a row the caller already holds locked
async fn adjust_balance(
    tx: &mut Transaction<'static, Postgres>,
    username: &Username,
    delta: i64,
) -> LedgerResult<()> {
    let updated = sqlx::query("UPDATE accounts SET balance = balance + $2 WHERE username = $1")
        .bind(username.as_str())
        .bind(delta)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if updated != 1 {
        return Err(LedgerError::Internal(format!(
            "balance update touched {updated} rows"
        )));
    }
    Ok(())
}

// ============================================================================
// Catalog store
// ============================================================================

async fn item_price(
    tx: &mut Transaction<'static, Postgres>,
    item: &ItemName,
) -> LedgerResult<Option<i64>> {
    let price = sqlx::query_scalar::<_, i64>("SELECT price FROM catalog WHERE item_name = $1")
        .bind(item.as_str())
        .fetch_optional(&mut **tx)
        .await?;

    Ok(price)
}

// ============================================================================
// Ledgers
// ============================================================================

impl PgShopRepository {
    /// Lock, check, update and insert for a purchase. Returns the open
    /// transaction so the caller decides when to commit.
    async fn stage_purchase(
        &self,
        buyer: &Username,
        item: &ItemName,
    ) -> LedgerResult<(Transaction<'static, Postgres>, PurchaseRecord, i64)> {
        let mut tx = self.begin_ledger_tx().await?;

        let balance = lock_account(&mut tx, buyer)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        let price = item_price(&mut tx, item)
            .await?
            .ok_or(LedgerError::ItemNotFound)?;

        let remaining = services::debit(balance, price).inspect_err(|_| {
            tracing::warn!(buyer = %buyer, item = %item, balance, price, "Purchase rejected");
        })?;

        adjust_balance(&mut tx, buyer, -price).await?;

        let id = PurchaseId::new();
        let purchased_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO purchases (purchase_id, username, item_name)
            VALUES ($1, $2, $3)
            RETURNING purchased_at
            "#,
        )
        .bind(id.into_uuid())
        .bind(buyer.as_str())
        .bind(item.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let record = PurchaseRecord {
            id,
            username: buyer.clone(),
            item_name: item.clone(),
            price,
            purchased_at,
        };
        Ok((tx, record, remaining))
    }

    /// Ordered pair lock, check, both updates and the insert for a transfer.
    async fn stage_transfer(
        &self,
        pair: &AccountPair,
        amount: Amount,
    ) -> LedgerResult<(Transaction<'static, Postgres>, TransferRecord, i64)> {
        let mut tx = self.begin_ledger_tx().await?;

        let rows = lock_pair(&mut tx, pair).await?;
        let balances = services::resolve_locked_balances(pair, &rows).inspect_err(|e| {
            if matches!(e, LedgerError::AccountNotFound) {
                tracing::warn!(from = %pair.from(), to = %pair.to(), "Transfer account missing");
            }
        })?;

        let after = services::apply_transfer(balances, amount).inspect_err(|_| {
            tracing::warn!(
                from = %pair.from(),
                to = %pair.to(),
                balance = balances.sender,
                amount = amount.get(),
                "Transfer rejected"
            );
        })?;

        adjust_balance(&mut tx, pair.from(), -amount.get()).await?;
        adjust_balance(&mut tx, pair.to(), amount.get()).await?;

        let id = TransferId::new();
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO transfers (transfer_id, from_user, to_user, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            "#,
        )
        .bind(id.into_uuid())
        .bind(pair.from().as_str())
        .bind(pair.to().as_str())
        .bind(amount.get())
        .fetch_one(&mut *tx)
        .await?;

        let record = TransferRecord {
            id,
            from_user: pair.from().clone(),
            to_user: pair.to().clone(),
            amount,
            created_at,
        };
        Ok((tx, record, after.sender))
    }
}

// The unit-of-work deadline covers everything up to COMMIT but not COMMIT
// itself: once COMMIT is sent its outcome is reported as the server decides.

impl PurchaseLedger for PgShopRepository {
    async fn buy(&self, buyer: &Username, item: &ItemName) -> LedgerResult<PurchaseRecord> {
        let (tx, record, remaining) = with_deadline(
            self.config.unit_of_work_timeout,
            self.stage_purchase(buyer, item),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_id = %record.id,
            buyer = %buyer,
            item = %item,
            price = record.price,
            balance = remaining,
            "Purchase committed"
        );

        Ok(record)
    }
}

impl TransferLedger for PgShopRepository {
    async fn transfer(&self, pair: &AccountPair, amount: Amount) -> LedgerResult<TransferRecord> {
        let (tx, record, sender_balance) = with_deadline(
            self.config.unit_of_work_timeout,
            self.stage_transfer(pair, amount),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            transfer_id = %record.id,
            from = %pair.from(),
            to = %pair.to(),
            amount = amount.get(),
            sender_balance,
            "Transfer committed"
        );

        Ok(record)
    }
}

// ============================================================================
// Projection
// ============================================================================

impl HistoryProjection for PgShopRepository {
    async fn inventory(&self, username: &Username) -> LedgerResult<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT item_name, COUNT(*) AS quantity
            FROM purchases
            WHERE username = $1
            GROUP BY item_name
            ORDER BY item_name
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryRow::into_item).collect())
    }

    async fn coin_history(&self, username: &Username) -> LedgerResult<CoinHistory> {
        let mut tx = self.begin_snapshot_tx().await?;

        let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM accounts WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;

        let received = sqlx::query_as::<_, CounterpartyRow>(
            r#"
            SELECT from_user AS counterparty, amount
            FROM transfers
            WHERE to_user = $1
            ORDER BY created_at DESC, transfer_id
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let sent = sqlx::query_as::<_, CounterpartyRow>(
            r#"
            SELECT to_user AS counterparty, amount
            FROM transfers
            WHERE from_user = $1
            ORDER BY created_at DESC, transfer_id
            "#,
        )
        .bind(username.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CoinHistory {
            balance,
            received: received.into_iter().map(CounterpartyRow::into_transfer).collect(),
            sent: sent.into_iter().map(CounterpartyRow::into_transfer).collect(),
        })
    }
}

// ============================================================================
// Accounts
// ============================================================================

impl AccountRepository for PgShopRepository {
    async fn find_credentials(&self, username: &Username) -> AuthResult<AccountLookup> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT username, password_hash FROM accounts WHERE username = $1",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(AccountLookup::Found(r.into_credentials()?)),
            None => Ok(AccountLookup::NotFound),
        }
    }

    async fn register(&self, account: &NewAccount) -> AuthResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (username, password_hash, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(account.username.as_str())
        .bind(account.password_hash.as_phc_string())
        .bind(account.balance)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct InventoryRow {
    item_name: String,
    quantity: i64,
}

impl InventoryRow {
    fn into_item(self) -> InventoryItem {
        InventoryItem {
            item_name: self.item_name,
            quantity: self.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CounterpartyRow {
    counterparty: String,
    amount: i64,
}

impl CounterpartyRow {
    fn into_transfer(self) -> CoinTransfer {
        CoinTransfer {
            counterparty: self.counterparty,
            amount: self.amount,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    username: String,
    password_hash: String,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<AccountCredentials> {
        let username = Username::new(self.username)
            .map_err(|e| AuthError::Internal(format!("stored username is invalid: {e}")))?;
        let password_hash = HashedPassword::from_phc_string(self.password_hash)?;
        Ok(AccountCredentials {
            username,
            password_hash,
        })
    }
}
