//! Domain service for the asset catalog and lending ledger.
//!
//! Borrow and return are atomic: the availability check and the write happen
//! in one conditional update, so concurrent check-outs of the same asset
//! cannot both succeed.

use serde::Serialize;
use thiserror::Error;

use crate::db::{Asset, LedgerEntry, NewAsset};
use crate::domain::{AssetId, LedgerAction, Role, UserId};
use crate::services::auth_service::UserInfo;

/// Domain errors for lending operations.
#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Asset {0} not found")]
    NotFound(AssetId),

    #[error("Asset not available")]
    Unavailable(AssetId),

    #[error("Unauthorized return attempt")]
    NotAssignee(AssetId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl LendingError {
    /// Short label for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::NotAssignee(_) => "not_assignee",
            Self::Validation(_) => "validation",
            Self::Database(_) => "database",
        }
    }
}

impl From<sea_orm::DbErr> for LendingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for LendingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Successful transition: the asset after the change plus the appended entry.
#[derive(Debug, Clone)]
pub struct LendingReceipt {
    pub asset: Asset,
    pub entry: LedgerEntry,
}

/// Role-filtered asset listing.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub view: Role,
    pub assets: Vec<Asset>,
    /// Only filled for the admin view.
    pub stats: Option<CatalogStats>,
}

/// Catalog-wide counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub available: usize,
    pub borrowed: usize,
}

impl CatalogStats {
    #[must_use]
    pub fn from_assets(assets: &[Asset]) -> Self {
        let available = assets.iter().filter(|a| a.is_available).count();
        Self {
            total: assets.len(),
            available,
            borrowed: assets.len() - available,
        }
    }
}

/// Domain service trait for lending.
#[async_trait::async_trait]
pub trait LendingService: Send + Sync {
    /// Checks an asset out to `actor`.
    ///
    /// # Errors
    ///
    /// [`LendingError::NotFound`] if the asset does not exist,
    /// [`LendingError::Unavailable`] if it is already borrowed.
    async fn borrow(&self, asset_id: AssetId, actor: &UserInfo)
    -> Result<LendingReceipt, LendingError>;

    /// Checks an asset back in.
    ///
    /// # Errors
    ///
    /// [`LendingError::NotFound`] if the asset does not exist,
    /// [`LendingError::NotAssignee`] unless `actor` currently holds it.
    async fn return_asset(
        &self,
        asset_id: AssetId,
        actor: &UserInfo,
    ) -> Result<LendingReceipt, LendingError>;

    /// Dispatches to [`LendingService::borrow`] or [`LendingService::return_asset`].
    async fn log_action(
        &self,
        asset_id: AssetId,
        action: LedgerAction,
        actor: &UserInfo,
    ) -> Result<LendingReceipt, LendingError> {
        match action {
            LedgerAction::CheckOut => self.borrow(asset_id, actor).await,
            LedgerAction::CheckIn => self.return_asset(asset_id, actor).await,
        }
    }

    /// Admins see every asset, users only what they hold.
    async fn dashboard(&self, actor: &UserInfo) -> Result<Dashboard, LendingError>;

    async fn list_assets(&self) -> Result<Vec<Asset>, LendingError>;

    async fn get_asset(&self, asset_id: AssetId) -> Result<Asset, LendingError>;

    async fn create_asset(&self, asset: NewAsset) -> Result<Asset, LendingError>;

    /// Ledger of one asset, oldest first.
    async fn asset_history(&self, asset_id: AssetId) -> Result<Vec<LedgerEntry>, LendingError>;

    /// Ledger of one user, newest first.
    async fn user_history(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LendingError>;

    /// Most recent ledger entries across all assets.
    async fn recent_transactions(&self, limit: u64) -> Result<Vec<LedgerEntry>, LendingError>;
}
