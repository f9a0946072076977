use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{IssueTokenRequest, IssueTokenResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn issue_token_handler(
    State(state): State<AppState>,
    Path(role_name): Path<String>,
    payload: Option<Json<IssueTokenRequest>>,
) -> ApiResult<Json<IssueTokenResponse>> {
    let requested_ttl = payload
        .and_then(|Json(request)| request.ttl)
        .map(Duration::from_secs);

    let token = state
        .token_service
        .issue_token(role_name.as_str(), requested_ttl)
        .await?;

    Ok(Json(IssueTokenResponse::from(token)))
}
