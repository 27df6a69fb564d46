use arbor::errors::AppError;
use arbor::users::{Role, User};

/// Helper function to check roles in route handlers
pub fn check_role(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not have permission to perform this action"))
    }
}
