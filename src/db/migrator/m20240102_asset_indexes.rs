use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_transactions_asset ON transactions(asset_id, id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id, id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_assets_assigned_to ON assets(assigned_to)",
        )
        .await?;

        // is_available and assigned_to must always agree
        conn.execute_unprepared(
            "CREATE TRIGGER IF NOT EXISTS trg_assets_assignment_insert
             BEFORE INSERT ON assets
             WHEN (NEW.is_available <> 0) = (NEW.assigned_to IS NOT NULL)
             BEGIN SELECT RAISE(ABORT, 'asset availability and assignment disagree'); END",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE TRIGGER IF NOT EXISTS trg_assets_assignment_update
             BEFORE UPDATE ON assets
             WHEN (NEW.is_available <> 0) = (NEW.assigned_to IS NOT NULL)
             BEGIN SELECT RAISE(ABORT, 'asset availability and assignment disagree'); END",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE TRIGGER IF NOT EXISTS trg_transactions_append_only
             BEFORE UPDATE ON transactions
             BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE TRIGGER IF NOT EXISTS trg_transactions_no_delete
             BEFORE DELETE ON transactions
             BEGIN SELECT RAISE(ABORT, 'transactions are append-only'); END",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP TRIGGER IF EXISTS trg_transactions_no_delete")
            .await?;
        conn.execute_unprepared("DROP TRIGGER IF EXISTS trg_transactions_append_only")
            .await?;
        conn.execute_unprepared("DROP TRIGGER IF EXISTS trg_assets_assignment_update")
            .await?;
        conn.execute_unprepared("DROP TRIGGER IF EXISTS trg_assets_assignment_insert")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_assets_assigned_to")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_transactions_user")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_transactions_asset")
            .await?;

        Ok(())
    }
}
