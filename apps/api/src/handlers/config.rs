use artikey_core::AppError;
use axum::Json;
use axum::extract::State;

use crate::dto::{BackendConfigResponse, UpdateBackendConfigRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn read_config_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<BackendConfigResponse>> {
    let view = state
        .backend_config_service
        .read()
        .await?
        .ok_or_else(|| AppError::NotFound("backend configuration has not been set up".to_owned()))?;

    Ok(Json(BackendConfigResponse::from(view)))
}

pub async fn write_config_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpdateBackendConfigRequest>,
) -> ApiResult<Json<BackendConfigResponse>> {
    let view = state.backend_config_service.write(payload.into()).await?;

    Ok(Json(BackendConfigResponse::from(view)))
}
