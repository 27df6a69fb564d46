use crate::handlers;
use crate::middleware::{auth_middleware, normalize_errors, panic_response};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

/// The router behind trailing-slash normalization.
pub type App = NormalizePath<Router>;

/// Build the served application.
///
/// Path normalization has to run before routing, so it wraps the router
/// instead of being one of its layers.
pub fn build_app(state: AppState) -> App {
    NormalizePath::trim_trailing_slash(build_router(state))
}

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    let users = Router::new()
        .route("/change-password", patch(handlers::change_password))
        .route("/me", get(handlers::get_me).patch(handlers::update_me))
        .route("/delete-me", delete(handlers::delete_me))
        .route("/{id}", get(handlers::get_user).delete(handlers::delete_user))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
        // Registration is the only public user route
        .route("/create", post(handlers::create_user))
        .method_not_allowed_fallback(handlers::not_found);

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1/users", users)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found);

    with_error_handling(router, state)
}

/// Wrap routes with panic capture, error normalization and tracing.
pub fn with_error_handling(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), normalize_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
