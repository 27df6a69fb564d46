pub mod requests;
pub mod responses;

pub use requests::{ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest};
pub use responses::{ApiResponse, ErrorEnvelope, HealthResponse};
