use super::models::User;
use super::repository::UserRepository;
use crate::ports::RepositoryError;
use async_trait::async_trait;
use sled::transaction::{abort, TransactionError};
use sled::{Db, Transactional};
use std::path::Path;
use uuid::Uuid;

const USERS_TREE: &str = "users";
const USERS_BY_EMAIL_TREE: &str = "users_by_email";

#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            RepositoryError::Initialization(format!(
                "failed to open database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(Self { db })
    }

    fn users_tree(&self) -> Result<sled::Tree, RepositoryError> {
        Ok(self.db.open_tree(USERS_TREE)?)
    }

    fn users_by_email_tree(&self) -> Result<sled::Tree, RepositoryError> {
        Ok(self.db.open_tree(USERS_BY_EMAIL_TREE)?)
    }

    fn decode(bytes: &[u8]) -> Result<User, RepositoryError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Reject writes with empty required arguments, reporting every one of them.
fn check_required_arguments(operation: &str, user: &User) -> Result<(), RepositoryError> {
    let required = [
        ("id", user.id.as_str()),
        ("name", user.name.as_str()),
        ("email", user.email.as_str()),
        ("password", user.password_hash.as_str()),
    ];

    let missing: Vec<String> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(argument, _)| format!("Argument `{}` is missing.", argument))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(RepositoryError::Validation(format!(
        "Invalid `user.{}()` invocation:\n\n{}",
        operation,
        missing.join("\n")
    )))
}

/// Ids are UUIDs; anything else is an invalid argument rather than a miss.
fn check_id(operation: &str, id: &str) -> Result<(), RepositoryError> {
    if Uuid::parse_str(id).is_ok() {
        return Ok(());
    }

    Err(RepositoryError::Validation(format!(
        "Invalid `user.{}()` invocation:\n\nArgument `id`: Invalid value provided. Expected UUID, provided String.",
        operation
    )))
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        check_required_arguments("create", &user)?;

        let users_tree = self.users_tree()?;
        let email_tree = self.users_by_email_tree()?;
        let user_json = serde_json::to_vec(&user)?;

        // Email claim and record land together or not at all
        let outcome = (&users_tree, &email_tree).transaction(|(users, emails)| {
            if emails.get(user.email.as_bytes())?.is_some() {
                return abort(RepositoryError::UniqueViolation("email".to_string()));
            }
            emails.insert(user.email.as_bytes(), user.id.as_bytes())?;
            users.insert(user.id.as_bytes(), user_json.as_slice())?;
            Ok(())
        });

        match outcome {
            Ok(()) => Ok(user),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email_tree = self.users_by_email_tree()?;
        let users_tree = self.users_tree()?;

        // First, get the user ID from email index
        if let Some(user_id) = email_tree.get(email.as_bytes())? {
            // Then get the user by ID
            if let Some(user_data) = users_tree.get(&user_id)? {
                return Ok(Some(Self::decode(&user_data)?));
            }
        }

        Ok(None)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        check_id("findUnique", id)?;
        let users_tree = self.users_tree()?;

        match users_tree.get(id.as_bytes())? {
            Some(user_data) => Ok(Some(Self::decode(&user_data)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        check_id("update", &user.id)?;
        check_required_arguments("update", &user)?;

        let users_tree = self.users_tree()?;

        // Check if user exists
        let Some(existing) = users_tree.get(user.id.as_bytes())? else {
            return Err(RepositoryError::Unknown(format!(
                "record to update not found: {}",
                user.id
            )));
        };

        if Self::decode(&existing)?.email != user.email {
            return Err(RepositoryError::Validation(
                "Invalid `user.update()` invocation:\n\nArgument `email`: Invalid value provided. Expected unchanged email, provided String."
                    .to_string(),
            ));
        }

        let user_json = serde_json::to_vec(&user)?;
        users_tree.insert(user.id.as_bytes(), user_json)?;

        Ok(user)
    }

    async fn delete(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        check_id("delete", id)?;
        let users_tree = self.users_tree()?;
        let email_tree = self.users_by_email_tree()?;

        match users_tree.remove(id.as_bytes())? {
            Some(user_data) => {
                let user = Self::decode(&user_data)?;

                // Remove from email index
                email_tree.remove(user.email.as_bytes())?;

                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let email_tree = self.users_by_email_tree()?;
        Ok(email_tree.contains_key(email.as_bytes())?)
    }
}
