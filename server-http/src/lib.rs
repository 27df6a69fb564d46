pub mod api;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

// Re-export key types
pub use middleware::error_handler::HttpError;
pub use routes::{build_app, build_router, with_error_handling, App};
pub use state::AppState;
