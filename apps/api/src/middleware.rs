use artikey_core::AppError;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::error::ApiResult;
use crate::state::AppState;

/// Rejects requests that do not carry `Authorization: Bearer {ADMIN_TOKEN}`.
pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    if !tokens_match(presented, &state.admin_token) {
        return Err(AppError::Unauthorized("invalid admin token".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
