//! Asset catalog and lending endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::observability;
use super::validation::{
    DEFAULT_TRANSACTION_LIMIT, MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, validate_asset_id,
    validate_asset_name, validate_limit, validate_optional_text,
};
use super::{
    ApiError, ApiResponse, AppState, AssetDto, CreateAssetRequest, DashboardDto,
    LendingResultDto, LogAssetRequest, TransactionDto, TransactionsQuery,
};
use crate::db::NewAsset;
use crate::domain::{LedgerAction, ParseEnumError};
use crate::services::UserInfo;

/// GET /dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let dashboard = state.lending().dashboard(&user).await?;
    Ok(Json(ApiResponse::success(dashboard.into())))
}

/// GET /assets
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AssetDto>>>, ApiError> {
    let assets = state.lending().list_assets().await?;
    Ok(Json(ApiResponse::success(
        assets.into_iter().map(AssetDto::from).collect(),
    )))
}

/// GET /assets/{id}
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AssetDto>>, ApiError> {
    let id = validate_asset_id(id)?;
    observability::record_asset(id);
    let asset = state.lending().get_asset(id).await?;
    Ok(Json(ApiResponse::success(asset.into())))
}

/// POST /assets (admin)
pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAssetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssetDto>>), ApiError> {
    let name = validate_asset_name(&payload.name)?;
    validate_optional_text("Category", payload.category.as_deref(), MAX_CATEGORY_LEN)?;
    validate_optional_text(
        "Description",
        payload.description.as_deref(),
        MAX_DESCRIPTION_LEN,
    )?;

    let asset = state
        .lending()
        .create_asset(NewAsset {
            name: name.to_string(),
            category: payload.category,
            description: payload.description,
        })
        .await?;

    observability::record_asset(asset.id);
    tracing::info!("Created asset '{}'", asset.name);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(asset.into()))))
}

/// GET /assets/{id}/history (admin)
pub async fn asset_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<TransactionDto>>>, ApiError> {
    let id = validate_asset_id(id)?;
    observability::record_asset(id);
    let entries = state.lending().asset_history(id).await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(TransactionDto::from).collect(),
    )))
}

/// GET|POST /borrow/{asset_id}
pub async fn borrow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    Path(asset_id): Path<i32>,
) -> Result<Json<ApiResponse<LendingResultDto>>, ApiError> {
    let asset_id = validate_asset_id(asset_id)?;
    observability::record_asset(asset_id);
    let receipt = state.lending().borrow(asset_id, &user).await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

/// POST /return/{asset_id}
pub async fn return_asset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    Path(asset_id): Path<i32>,
) -> Result<Json<ApiResponse<LendingResultDto>>, ApiError> {
    let asset_id = validate_asset_id(asset_id)?;
    observability::record_asset(asset_id);
    let receipt = state.lending().return_asset(asset_id, &user).await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

/// POST /log_asset
/// Body: `{"asset_id": 1, "action": "check-out" | "check-in"}`
pub async fn log_asset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
    Json(payload): Json<LogAssetRequest>,
) -> Result<Json<ApiResponse<LendingResultDto>>, ApiError> {
    let asset_id = validate_asset_id(payload.asset_id)?;
    observability::record_asset(asset_id);
    let action: LedgerAction = payload
        .action
        .parse()
        .map_err(|e: ParseEnumError| ApiError::validation(e.to_string()))?;
    let receipt = state
        .lending()
        .log_action(asset_id, action, &user)
        .await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

/// GET /transactions
pub async fn my_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<ApiResponse<Vec<TransactionDto>>>, ApiError> {
    let entries = state.lending().user_history(user.id).await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(TransactionDto::from).collect(),
    )))
}

/// GET /transactions/all (admin)
pub async fn all_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionDto>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT))?;
    let entries = state.lending().recent_transactions(limit as u64).await?;
    Ok(Json(ApiResponse::success(
        entries.into_iter().map(TransactionDto::from).collect(),
    )))
}
