// Public API
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod sled_repository;

// Re-export commonly used types
pub use models::{NewUser, ProfileUpdate, Role, User, UserProfile};
pub use repository::UserRepository;
pub use service::{normalize_email, profile_cache_key, UserService};
pub use sled_repository::SledUserRepository;
