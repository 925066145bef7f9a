//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::events::NotificationEvent;
use crate::domain::{Role, UserId};
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, UserInfo, validate_password, validate_username,
};
use crate::services::token::TokenIssuer;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    tokens: TokenIssuer,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        security: SecurityConfig,
        tokens: TokenIssuer,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            security,
            tokens,
            event_bus,
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        validate_username(username)?;
        validate_password(password)?;

        let user = self
            .store
            .create_user(username, password, Role::User, &self.security)
            .await?
            .ok_or(AuthError::UsernameTaken)?;

        info!(user_id = %user.id, "Registered user {}", user.username);

        let _ = self.event_bus.send(NotificationEvent::UserRegistered {
            user_id: user.id,
            username: user.username.clone(),
        });

        Ok(UserInfo::from(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .verify_user_password(username, password, &self.security)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let issued = self
            .tokens
            .issue(user.id, &user.username, user.role)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(LoginResult {
            user: UserInfo::from(user),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    async fn authenticate_token(&self, token: &str) -> Result<UserInfo, AuthError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;

        // Role comes from the database so promotions apply before the token expires
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.username != claims.username {
            warn!(%user_id, "Token subject does not match stored username");
            return Err(AuthError::InvalidToken);
        }

        Ok(UserInfo::from(user))
    }

    async fn get_user(&self, id: UserId) -> Result<UserInfo, AuthError> {
        self.store
            .get_user(id)
            .await?
            .map(UserInfo::from)
            .ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(username, current_password, &self.security)
            .await?
            .is_some();

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(username, new_password, &self.security)
            .await?;

        info!("Password changed for user: {username}");
        Ok(())
    }
}
