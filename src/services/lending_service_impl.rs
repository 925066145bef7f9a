//! `SeaORM` implementation of the `LendingService` trait.

use crate::db::{Asset, LedgerEntry, LendingOutcome, NewAsset, Store};
use crate::domain::events::NotificationEvent;
use crate::domain::{AssetId, LedgerAction, Role, UserId};
use crate::services::auth_service::UserInfo;
use crate::services::lending_service::{
    CatalogStats, Dashboard, LendingError, LendingReceipt, LendingService,
};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct SeaOrmLendingService {
    store: Store,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmLendingService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<NotificationEvent>) -> Self {
        Self { store, event_bus }
    }

    fn settle(
        &self,
        outcome: LendingOutcome,
        asset_id: AssetId,
        action: LedgerAction,
        actor: &UserInfo,
    ) -> Result<LendingReceipt, LendingError> {
        let result = match outcome {
            LendingOutcome::Completed { asset, entry } => Ok(LendingReceipt { asset, entry }),
            LendingOutcome::NotFound => Err(LendingError::NotFound(asset_id)),
            LendingOutcome::Unavailable => Err(LendingError::Unavailable(asset_id)),
            LendingOutcome::NotAssignee => Err(LendingError::NotAssignee(asset_id)),
        };

        match &result {
            Ok(receipt) => {
                let event = match action {
                    LedgerAction::CheckOut => {
                        metrics::counter!("lending_checkouts_total").increment(1);
                        NotificationEvent::AssetCheckedOut {
                            asset_id,
                            asset_name: receipt.asset.name.clone(),
                            user_id: actor.id,
                            username: actor.username.clone(),
                        }
                    }
                    LedgerAction::CheckIn => {
                        metrics::counter!("lending_checkins_total").increment(1);
                        NotificationEvent::AssetCheckedIn {
                            asset_id,
                            asset_name: receipt.asset.name.clone(),
                            user_id: actor.id,
                            username: actor.username.clone(),
                        }
                    }
                };
                info!(
                    %asset_id,
                    user_id = %actor.id,
                    action = %action,
                    "{} {} asset '{}'",
                    actor.username,
                    action,
                    receipt.asset.name
                );
                let _ = self.event_bus.send(event);
            }
            Err(e) => {
                metrics::counter!("lending_rejections_total", "reason" => e.reason()).increment(1);
                warn!(%asset_id, user_id = %actor.id, action = %action, "Lending rejected: {e}");
            }
        }

        result
    }
}

#[async_trait]
impl LendingService for SeaOrmLendingService {
    async fn borrow(
        &self,
        asset_id: AssetId,
        actor: &UserInfo,
    ) -> Result<LendingReceipt, LendingError> {
        let outcome = self.store.check_out_asset(asset_id, actor.id).await?;
        self.settle(outcome, asset_id, LedgerAction::CheckOut, actor)
    }

    async fn return_asset(
        &self,
        asset_id: AssetId,
        actor: &UserInfo,
    ) -> Result<LendingReceipt, LendingError> {
        let outcome = self.store.check_in_asset(asset_id, actor.id).await?;
        self.settle(outcome, asset_id, LedgerAction::CheckIn, actor)
    }

    async fn dashboard(&self, actor: &UserInfo) -> Result<Dashboard, LendingError> {
        let dashboard = match actor.role {
            Role::Admin => {
                let assets = self.store.list_assets().await?;
                Dashboard {
                    view: Role::Admin,
                    stats: Some(CatalogStats::from_assets(&assets)),
                    assets,
                }
            }
            Role::User => Dashboard {
                view: Role::User,
                assets: self.store.list_assets_assigned_to(actor.id).await?,
                stats: None,
            },
        };

        Ok(dashboard)
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, LendingError> {
        Ok(self.store.list_assets().await?)
    }

    async fn get_asset(&self, asset_id: AssetId) -> Result<Asset, LendingError> {
        self.store
            .get_asset(asset_id)
            .await?
            .ok_or(LendingError::NotFound(asset_id))
    }

    async fn create_asset(&self, asset: NewAsset) -> Result<Asset, LendingError> {
        let name = asset.name.trim();
        if name.is_empty() {
            return Err(LendingError::Validation(
                "Asset name cannot be empty".to_string(),
            ));
        }

        let normalized = NewAsset {
            name: name.to_string(),
            category: normalize_optional(asset.category),
            description: normalize_optional(asset.description),
        };

        let created = self.store.add_asset(&normalized).await?;

        let _ = self.event_bus.send(NotificationEvent::AssetCreated {
            asset_id: created.id,
            name: created.name.clone(),
        });

        Ok(created)
    }

    async fn asset_history(&self, asset_id: AssetId) -> Result<Vec<LedgerEntry>, LendingError> {
        if self.store.get_asset(asset_id).await?.is_none() {
            return Err(LendingError::NotFound(asset_id));
        }
        Ok(self.store.get_asset_history(asset_id).await?)
    }

    async fn user_history(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LendingError> {
        Ok(self.store.get_user_history(user_id).await?)
    }

    async fn recent_transactions(&self, limit: u64) -> Result<Vec<LedgerEntry>, LendingError> {
        Ok(self.store.get_recent_transactions(limit).await?)
    }
}

/// Blank optional text is stored as NULL.
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
