use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::NotificationEvent;
use crate::services::{
    AuthService, LendingService, SeaOrmAuthService, SeaOrmLendingService, TokenIssuer,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: broadcast::Sender<NotificationEvent>,

    pub auth_service: Arc<dyn AuthService>,

    pub lending_service: Arc<dyn LendingService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);

        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
            TokenIssuer::from_config(&config.security),
            event_bus.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let lending_service = Arc::new(SeaOrmLendingService::new(
            store.clone(),
            event_bus.clone(),
        )) as Arc<dyn LendingService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            event_bus,
            auth_service,
            lending_service,
        })
    }
}
