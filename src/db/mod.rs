use crate::config::SecurityConfig;
use crate::domain::{AssetId, Role, UserId};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked SQLite database before failing.
const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

pub mod migrator;
pub mod repositories;

pub use repositories::asset::{Asset, NewAsset};
pub use repositories::ledger::{LedgerEntry, LendingOutcome};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if db_url.starts_with("sqlite:") && !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite:")
                .trim_start_matches("//")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !path_str.is_empty() && !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(|opts| opts.busy_timeout(SQLITE_BUSY_TIMEOUT));

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn asset_repo(&self) -> repositories::asset::AssetRepository {
        repositories::asset::AssetRepository::new(self.conn.clone())
    }

    fn ledger_repo(&self) -> repositories::ledger::LedgerRepository {
        repositories::ledger::LedgerRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .create(username, password, role, config)
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo()
            .verify_password(username, password, config)
            .await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn set_user_role(&self, username: &str, role: Role) -> Result<bool> {
        self.user_repo().set_role(username, role).await
    }

    // ========================================================================
    // Assets
    // ========================================================================

    pub async fn add_asset(&self, asset: &NewAsset) -> Result<Asset> {
        self.asset_repo().create(asset).await
    }

    pub async fn get_asset(&self, id: AssetId) -> Result<Option<Asset>> {
        self.asset_repo().get(id).await
    }

    pub async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.asset_repo().list_all().await
    }

    pub async fn list_assets_assigned_to(&self, user_id: UserId) -> Result<Vec<Asset>> {
        self.asset_repo().list_assigned_to(user_id).await
    }

    // ========================================================================
    // Lending
    // ========================================================================

    pub async fn check_out_asset(&self, asset_id: AssetId, user_id: UserId) -> Result<LendingOutcome> {
        self.ledger_repo().check_out(asset_id, user_id).await
    }

    pub async fn check_in_asset(&self, asset_id: AssetId, user_id: UserId) -> Result<LendingOutcome> {
        self.ledger_repo().check_in(asset_id, user_id).await
    }

    pub async fn get_asset_history(&self, asset_id: AssetId) -> Result<Vec<LedgerEntry>> {
        self.ledger_repo().history_for_asset(asset_id).await
    }

    pub async fn get_user_history(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        self.ledger_repo().history_for_user(user_id).await
    }

    pub async fn get_recent_transactions(&self, limit: u64) -> Result<Vec<LedgerEntry>> {
        self.ledger_repo().recent(limit).await
    }

    pub async fn count_asset_transactions(&self, asset_id: AssetId) -> Result<u64> {
        self.ledger_repo().count_for_asset(asset_id).await
    }
}
