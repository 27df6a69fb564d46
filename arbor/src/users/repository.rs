use super::models::User;
use crate::ports::RepositoryError;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Update a user
    async fn update(&self, user: User) -> Result<User, RepositoryError>;

    /// Delete a user by ID, returning the removed record if there was one
    async fn delete(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError>;
}
