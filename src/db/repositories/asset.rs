use crate::domain::{AssetId, AssetState, UserId};
use crate::entities::{assets, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

/// Repository for the asset catalog
pub struct AssetRepository {
    conn: DatabaseConnection,
}

impl AssetRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, asset: &NewAsset) -> Result<Asset> {
        let now = chrono::Utc::now().to_rfc3339();
        let active_model = assets::ActiveModel {
            name: Set(asset.name.clone()),
            category: Set(asset.category.clone()),
            description: Set(asset.description.clone()),
            is_available: Set(true),
            assigned_to: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert asset")?;
        info!("Added asset {}: {}", model.id, model.name);
        Ok(Asset::from(model))
    }

    pub async fn get(&self, id: AssetId) -> Result<Option<Asset>> {
        let result = Assets::find_by_id(id.value()).one(&self.conn).await?;
        Ok(result.map(Asset::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Asset>> {
        let rows = Assets::find()
            .order_by_asc(assets::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Asset::from).collect())
    }

    pub async fn list_assigned_to(&self, user_id: UserId) -> Result<Vec<Asset>> {
        let rows = Assets::find()
            .filter(assets::Column::AssignedTo.eq(user_id.value()))
            .order_by_asc(assets::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Asset::from).collect())
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewAsset {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_available: bool,
    pub assigned_to: Option<UserId>,
    pub created_at: String,
    pub updated_at: String,
}

impl Asset {
    /// Lending state, or `None` if the stored columns disagree.
    #[must_use]
    pub fn state(&self) -> Option<AssetState> {
        AssetState::from_columns(self.is_available, self.assigned_to.map(i32::from))
    }
}

impl From<assets::Model> for Asset {
    fn from(r: assets::Model) -> Self {
        Self {
            id: AssetId::new(r.id),
            name: r.name,
            category: r.category,
            description: r.description,
            is_available: r.is_available,
            assigned_to: r.assigned_to.map(UserId::new),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
