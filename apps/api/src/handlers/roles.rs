use artikey_application::SaveRoleInput;
use artikey_core::AppError;
use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{
    DeleteRoleResponse, RoleListResponse, RoleResponse, SaveRoleRequest, SaveRoleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<RoleListResponse>> {
    let roles = state.reconciliation_service.list_roles().await?;

    Ok(Json(RoleListResponse { roles }))
}

pub async fn read_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .reconciliation_service
        .find_role(role_name.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn save_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
    Json(payload): Json<SaveRoleRequest>,
) -> ApiResult<Json<SaveRoleResponse>> {
    let outcome = state
        .reconciliation_service
        .save_role(SaveRoleInput {
            name: role_name,
            token_ttl_seconds: payload.token_ttl,
            max_ttl_seconds: payload.max_ttl,
            permission_targets: payload.raw_permission_targets(),
        })
        .await?;

    Ok(Json(SaveRoleResponse::from(outcome)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
) -> ApiResult<Json<DeleteRoleResponse>> {
    let outcome = state
        .reconciliation_service
        .delete_role(role_name.as_str())
        .await?;

    Ok(Json(DeleteRoleResponse::from(outcome)))
}
