use arbor::cache::CacheService;
use arbor::users::UserService;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub cache: CacheService,
    /// Development mode: error responses carry the stack trace
    pub debug_mode: bool,
}

impl AppState {
    pub fn new(user_service: Arc<UserService>, cache: CacheService, debug_mode: bool) -> Self {
        Self {
            user_service,
            cache,
            debug_mode,
        }
    }
}
