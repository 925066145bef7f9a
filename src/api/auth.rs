use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, CredentialsRequest, LoginResponse,
    MessageResponse, UserDto,
};
use crate::domain::UserId;
use crate::services::{AuthError, UserInfo};

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller from:
/// 1. Session cookie (from login)
/// 2. `Authorization: Bearer <token>` header
///
/// The resolved [`UserInfo`] is placed in request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match session_user(&state, &session).await? {
        Some(user) => Some(user),
        None => match extract_bearer_token(&headers) {
            Some(token) => match state.auth().authenticate_token(&token).await {
                Ok(user) => Some(user),
                Err(AuthError::InvalidToken) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        },
    };

    let Some(user) = user else {
        return Err(ApiError::unauthenticated());
    };

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Rejects callers that are not administrators. Runs after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<UserInfo>()
        .ok_or_else(ApiError::unauthenticated)?
        .is_admin();

    if !is_admin {
        return Err(ApiError::admin_only());
    }

    Ok(next.run(request).await)
}

async fn session_user(state: &AppState, session: &Session) -> Result<Option<UserInfo>, ApiError> {
    let Ok(Some(id)) = session.get::<i32>(SESSION_USER_KEY).await else {
        return Ok(None);
    };

    match state.auth().get_user(UserId::new(id)).await {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::UserNotFound) => {
            // Account vanished since login
            let _ = session.flush().await;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state
        .auth()
        .register(payload.username.trim(), &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// POST /login
/// Starts a cookie session and also returns a bearer token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth()
        .login(payload.username.trim(), &payload.password)
        .await?;

    // Fresh session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, result.user.id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = %result.user.id, "User {} logged in", result.user.username);

    Ok(Json(ApiResponse::success(LoginResponse {
        user: result.user.into(),
        token: result.token,
        token_type: "Bearer",
        expires_at: result.expires_at,
    })))
}

/// POST /logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;
    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /me
pub async fn me(Extension(user): Extension<UserInfo>) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(user.into()))
}

/// PUT /me/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth()
        .change_password(
            &user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
