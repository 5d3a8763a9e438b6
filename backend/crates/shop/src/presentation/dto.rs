//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::InfoOutput;
use crate::domain::entities::{CoinTransfer, InventoryItem};

/// Request for POST /api/auth
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// Response for POST /api/auth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Request for POST /api/sendCoin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    pub to_user: String,
    pub amount: i64,
}

/// Response for GET /api/info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub coins: i64,
    pub inventory: Vec<InventoryEntry>,
    pub coin_history: CoinHistoryResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinHistoryResponse {
    pub received: Vec<ReceivedEntry>,
    pub sent: Vec<SentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedEntry {
    pub from_user: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEntry {
    pub to_user: String,
    pub amount: i64,
}

impl From<InventoryItem> for InventoryEntry {
    fn from(item: InventoryItem) -> Self {
        Self {
            item_type: item.item_name,
            quantity: item.quantity,
        }
    }
}

impl From<CoinTransfer> for ReceivedEntry {
    fn from(t: CoinTransfer) -> Self {
        Self {
            from_user: t.counterparty,
            amount: t.amount,
        }
    }
}

impl From<CoinTransfer> for SentEntry {
    fn from(t: CoinTransfer) -> Self {
        Self {
            to_user: t.counterparty,
            amount: t.amount,
        }
    }
}

impl From<InfoOutput> for InfoResponse {
    fn from(info: InfoOutput) -> Self {
        Self {
            coins: info.history.balance,
            inventory: info.inventory.into_iter().map(Into::into).collect(),
            coin_history: CoinHistoryResponse {
                received: info.history.received.into_iter().map(Into::into).collect(),
                sent: info.history.sent.into_iter().map(Into::into).collect(),
            },
        }
    }
}
