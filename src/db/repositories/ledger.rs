use std::collections::HashMap;

use crate::db::repositories::asset::Asset;
use crate::domain::{AssetId, AssetState, LedgerAction, UserId};
use crate::entities::{assets, prelude::*, transactions, users};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::debug;

/// Repository for lending transitions and the transaction audit trail.
///
/// Check-out and check-in each run in one database transaction whose first
/// statement is a conditional UPDATE on the asset row. Exactly one of any set
/// of racing callers can match the condition; the rest observe zero affected
/// rows and write nothing.
pub struct LedgerRepository {
    conn: DatabaseConnection,
}

impl LedgerRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn check_out(&self, asset_id: AssetId, user_id: UserId) -> Result<LendingOutcome> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();
        let (is_available, assigned_to) = AssetState::Borrowed { holder: user_id }.into_columns();

        let updated = Assets::update_many()
            .col_expr(assets::Column::IsAvailable, Expr::value(is_available))
            .col_expr(assets::Column::AssignedTo, Expr::value(assigned_to))
            .col_expr(assets::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(assets::Column::Id.eq(asset_id.value()))
            .filter(assets::Column::IsAvailable.eq(true))
            .exec(&txn)
            .await
            .context("Failed to mark asset as checked out")?;

        if updated.rows_affected == 0 {
            let outcome = if Self::asset_exists(&txn, asset_id).await? {
                LendingOutcome::Unavailable
            } else {
                LendingOutcome::NotFound
            };
            txn.rollback().await?;
            debug!(%asset_id, %user_id, ?outcome, "Check-out rejected");
            return Ok(outcome);
        }

        Self::append(txn, asset_id, user_id, LedgerAction::CheckOut, now).await
    }

    pub async fn check_in(&self, asset_id: AssetId, user_id: UserId) -> Result<LendingOutcome> {
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();
        let (is_available, assigned_to) = AssetState::Available.into_columns();

        let updated = Assets::update_many()
            .col_expr(assets::Column::IsAvailable, Expr::value(is_available))
            .col_expr(assets::Column::AssignedTo, Expr::value(assigned_to))
            .col_expr(assets::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(assets::Column::Id.eq(asset_id.value()))
            .filter(assets::Column::IsAvailable.eq(false))
            .filter(assets::Column::AssignedTo.eq(user_id.value()))
            .exec(&txn)
            .await
            .context("Failed to mark asset as checked in")?;

        if updated.rows_affected == 0 {
            let outcome = if Self::asset_exists(&txn, asset_id).await? {
                LendingOutcome::NotAssignee
            } else {
                LendingOutcome::NotFound
            };
            txn.rollback().await?;
            debug!(%asset_id, %user_id, ?outcome, "Check-in rejected");
            return Ok(outcome);
        }

        Self::append(txn, asset_id, user_id, LedgerAction::CheckIn, now).await
    }

    async fn asset_exists(txn: &DatabaseTransaction, asset_id: AssetId) -> Result<bool> {
        let count = Assets::find_by_id(asset_id.value()).count(txn).await?;
        Ok(count > 0)
    }

    /// Records the audit row and commits the transition.
    async fn append(
        txn: DatabaseTransaction,
        asset_id: AssetId,
        user_id: UserId,
        action: LedgerAction,
        now: String,
    ) -> Result<LendingOutcome> {
        let entry = transactions::ActiveModel {
            asset_id: Set(asset_id.value()),
            user_id: Set(user_id.value()),
            action: Set(action.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to append ledger entry")?;

        let asset = Assets::find_by_id(asset_id.value())
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Asset {asset_id} disappeared during {action}"))?;

        let entry = LedgerEntry::try_from(entry)?;
        txn.commit()
            .await
            .context("Failed to commit lending transition")?;

        Ok(LendingOutcome::Completed {
            asset: Asset::from(asset),
            entry,
        })
    }

    pub async fn history_for_asset(&self, asset_id: AssetId) -> Result<Vec<LedgerEntry>> {
        let rows = Transactions::find()
            .filter(transactions::Column::AssetId.eq(asset_id.value()))
            .order_by_asc(transactions::Column::Id)
            .all(&self.conn)
            .await?;

        self.enrich(rows).await
    }

    pub async fn history_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let rows = Transactions::find()
            .filter(transactions::Column::UserId.eq(user_id.value()))
            .order_by_desc(transactions::Column::Id)
            .all(&self.conn)
            .await?;

        self.enrich(rows).await
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<LedgerEntry>> {
        let rows = Transactions::find()
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        self.enrich(rows).await
    }

    pub async fn count_for_asset(&self, asset_id: AssetId) -> Result<u64> {
        let count = Transactions::find()
            .filter(transactions::Column::AssetId.eq(asset_id.value()))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    /// Attaches usernames and asset names with one batch query each.
    async fn enrich(&self, rows: Vec<transactions::Model>) -> Result<Vec<LedgerEntry>> {
        let mut user_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut asset_ids: Vec<i32> = rows.iter().map(|r| r.asset_id).collect();
        asset_ids.sort_unstable();
        asset_ids.dedup();

        let usernames: HashMap<i32, String> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(users::Column::Id.is_in(user_ids))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        let asset_names: HashMap<i32, String> = if asset_ids.is_empty() {
            HashMap::new()
        } else {
            Assets::find()
                .filter(assets::Column::Id.is_in(asset_ids))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|a| (a.id, a.name))
                .collect()
        };

        rows.into_iter()
            .map(|row| -> Result<LedgerEntry> {
                let username = usernames.get(&row.user_id).cloned();
                let asset_name = asset_names.get(&row.asset_id).cloned();
                let mut entry = LedgerEntry::try_from(row)?;
                entry.username = username;
                entry.asset_name = asset_name;
                Ok(entry)
            })
            .collect()
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i32,
    pub asset_id: AssetId,
    pub user_id: UserId,
    pub action: LedgerAction,
    pub created_at: String,
    pub username: Option<String>,
    pub asset_name: Option<String>,
}

impl TryFrom<transactions::Model> for LedgerEntry {
    type Error = anyhow::Error;

    fn try_from(r: transactions::Model) -> Result<Self> {
        let action = r
            .action
            .parse()
            .with_context(|| format!("Corrupt ledger entry {}", r.id))?;

        Ok(Self {
            id: r.id,
            asset_id: AssetId::new(r.asset_id),
            user_id: UserId::new(r.user_id),
            action,
            created_at: r.created_at,
            username: None,
            asset_name: None,
        })
    }
}

/// Result of a lending transition attempt.
#[derive(Debug, Clone)]
pub enum LendingOutcome {
    Completed { asset: Asset, entry: LedgerEntry },
    NotFound,
    Unavailable,
    NotAssignee,
}
