use serde::{Deserialize, Serialize};

use crate::db::{Asset, LedgerEntry};
use crate::domain::{AssetState, LedgerAction, Role};
use crate::services::{CatalogStats, Dashboard, LendingReceipt, UserInfo};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssetRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogAssetRequest {
    pub asset_id: i32,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<usize>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<UserInfo> for UserDto {
    fn from(user: UserInfo) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct AssetDto {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_available: bool,
    pub status: &'static str,
    pub assigned_to: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Asset> for AssetDto {
    fn from(asset: Asset) -> Self {
        let status = match asset.state() {
            Some(AssetState::Available) => "available",
            Some(AssetState::Borrowed { .. }) => "borrowed",
            None => "inconsistent",
        };

        Self {
            id: asset.id.value(),
            name: asset.name,
            category: asset.category,
            description: asset.description,
            is_available: asset.is_available,
            status,
            assigned_to: asset.assigned_to.map(i32::from),
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionDto {
    pub id: i32,
    pub asset_id: i32,
    pub asset_name: Option<String>,
    pub user_id: i32,
    pub username: Option<String>,
    pub action: LedgerAction,
    pub created_at: String,
}

impl From<LedgerEntry> for TransactionDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            asset_id: entry.asset_id.value(),
            asset_name: entry.asset_name,
            user_id: entry.user_id.value(),
            username: entry.username,
            action: entry.action,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LendingResultDto {
    pub asset: AssetDto,
    pub transaction: TransactionDto,
}

impl From<LendingReceipt> for LendingResultDto {
    fn from(receipt: LendingReceipt) -> Self {
        Self {
            asset: receipt.asset.into(),
            transaction: receipt.entry.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub view: Role,
    pub assets: Vec<AssetDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CatalogStats>,
}

impl From<Dashboard> for DashboardDto {
    fn from(dashboard: Dashboard) -> Self {
        Self {
            view: dashboard.view,
            assets: dashboard.assets.into_iter().map(AssetDto::from).collect(),
            stats: dashboard.stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
    pub users: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
