use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/config",
            get(handlers::config::read_config_handler).put(handlers::config::write_config_handler),
        )
        .route("/api/roles", get(handlers::roles::list_roles_handler))
        .route(
            "/api/roles/{role_name}",
            get(handlers::roles::read_role_handler)
                .put(handlers::roles::save_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/tokens/{role_name}",
            post(handlers::tokens::issue_token_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_admin_token,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
