pub mod authentication;
pub mod authorization;
pub mod error_handler;

pub use authentication::{auth_middleware, CurrentUser};
pub use authorization::check_role;
pub use error_handler::{normalize_errors, panic_response, HttpError};
