use super::models::{NewUser, ProfileUpdate, Role, User, UserProfile};
use super::password::{hash_password, verify_password};
use super::repository::UserRepository;
use crate::cache::CacheService;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    cache: CacheService,
}

/// Emails are matched case-insensitively, ignoring surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Cache key for a user's public profile.
pub fn profile_cache_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, cache: CacheService) -> Self {
        Self { user_repo, cache }
    }

    /// Register a new account
    pub async fn create_user(&self, new_user: NewUser) -> AppResult<UserProfile> {
        let email = normalize_email(&new_user.email);
        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::conflict("A user with this email already exists"));
        }

        let password_hash = hash_password(&new_user.password)?;
        let user = User::new(new_user.name, email, password_hash, new_user.role);

        let created = self.user_repo.create(user).await?;
        Ok(created.into())
    }

    /// Create the seed administrator unless the email is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AppResult<bool> {
        let email = normalize_email(email);
        if self.user_repo.email_exists(&email).await? {
            return Ok(false);
        }

        self.create_user(NewUser {
            name: "Administrator".to_string(),
            email,
            password: password.to_string(),
            role: Role::Admin,
        })
        .await?;
        Ok(true)
    }

    /// Verify credentials, returning the full user record
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        Ok(user)
    }

    /// Public profile, served from cache when possible
    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        let key = profile_cache_key(user_id);

        if let Some(profile) = self.cache.get::<UserProfile>(&key).await.value() {
            debug!("Profile cache hit for {}", user_id);
            return Ok(profile);
        }

        let user = self.find_user(user_id).await?;
        let profile = UserProfile::from(&user);

        // Best effort: a failed write only costs the next read a lookup
        let _ = self.cache.set_default(&key, &profile).await;

        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> AppResult<UserProfile> {
        let mut user = self.find_user(user_id).await?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(profile_image) = update.profile_image {
            user.profile_image = Some(profile_image);
        }
        user.updated_at = Utc::now();

        let updated = self.user_repo.update(user).await?;
        let _ = self.cache.delete(&profile_cache_key(user_id)).await;

        Ok(updated.into())
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let mut user = self.find_user(user_id).await?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();

        self.user_repo.update(user).await?;
        Ok(())
    }

    /// Remove an account and everything cached under it
    pub async fn delete_user(&self, user_id: &str) -> AppResult<UserProfile> {
        let removed = self
            .user_repo
            .delete(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let purged = self
            .cache
            .delete_pattern(&format!("{}*", profile_cache_key(user_id)))
            .await
            .value();
        debug!("Purged {} cache entries for deleted user {}", purged, user_id);

        Ok(removed.into())
    }

    async fn find_user(&self, user_id: &str) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{classify, ErrorKind};
    use crate::ports::KeyValueStore;
    use crate::users::sled_repository::SledUserRepository;
    use async_trait::async_trait;
    use shared::{Error, Result, TtlSecs};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MapStore {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }
        async fn set_ex(&self, key: &str, value: String, _ttl: TtlSecs) -> Result<()> {
            self.values.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn del(&self, keys: &[String]) -> Result<u64> {
            let mut values = self.values.lock().unwrap();
            Ok(keys.iter().filter(|k| values.remove(*k).is_some()).count() as u64)
        }
        async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
            let prefix = pattern.trim_end_matches('*');
            Ok(self
                .values
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
        async fn exists(&self, key: &str) -> Result<bool> {
            Ok(self.values.lock().unwrap().contains_key(key))
        }
        async fn ttl(&self, _key: &str) -> Result<i64> {
            Ok(-1)
        }
        async fn hget(&self, _key: &str, _field: &str) -> Result<Option<String>> {
            Err(Error::Internal("unused".to_string()))
        }
        async fn hset(&self, _key: &str, _field: &str, _value: String) -> Result<()> {
            Err(Error::Internal("unused".to_string()))
        }
        async fn incr(&self, _key: &str) -> Result<i64> {
            Err(Error::Internal("unused".to_string()))
        }
        async fn decr(&self, _key: &str) -> Result<i64> {
            Err(Error::Internal("unused".to_string()))
        }
        async fn quit(&self) -> Result<()> {
            Ok(())
        }
    }

    fn service(temp_dir: &TempDir) -> (UserService, Arc<MapStore>) {
        let repo = SledUserRepository::new(temp_dir.path().join("users.sled")).unwrap();
        let store = Arc::new(MapStore::default());
        let cache = CacheService::new(store.clone());
        (UserService::new(Arc::new(repo), cache), store)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Grace".to_string(),
            email: email.to_string(),
            password: "hopper1906".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        let profile = service.create_user(new_user("grace@example.com")).await.unwrap();
        assert_eq!(profile.role, Role::User);

        let user = service.authenticate("grace@example.com", "hopper1906").await.unwrap();
        assert_eq!(user.id, profile.id);

        let err = service
            .authenticate("grace@example.com", "wrong-password1")
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        service.create_user(new_user("dup@example.com")).await.unwrap();
        let err = service.create_user(new_user("dup@example.com")).await.unwrap_err();

        assert_eq!(classify(&err, false).status_code, 409);
    }

    #[tokio::test]
    async fn test_profile_is_cached_and_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let (service, store) = service(&temp_dir);

        let profile = service.create_user(new_user("cache@example.com")).await.unwrap();
        let key = profile_cache_key(&profile.id);

        service.get_profile(&profile.id).await.unwrap();
        assert!(store.values.lock().unwrap().contains_key(&key));

        let updated = service
            .update_profile(
                &profile.id,
                ProfileUpdate {
                    name: Some("Rear Admiral".to_string()),
                    profile_image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Rear Admiral");
        assert!(!store.values.lock().unwrap().contains_key(&key));

        let reloaded = service.get_profile(&profile.id).await.unwrap();
        assert_eq!(reloaded.name, "Rear Admiral");

        service.delete_user(&profile.id).await.unwrap();
        assert!(store.values.lock().unwrap().is_empty());

        let err = service.get_profile(&profile.id).await.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_ensure_admin_only_creates_once() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        assert!(service.ensure_admin("root@example.com", "rootpass123").await.unwrap());
        assert!(!service.ensure_admin("root@example.com", "otherpass123").await.unwrap());

        let admin = service.authenticate("root@example.com", "rootpass123").await.unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn test_change_password() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        let profile = service.create_user(new_user("pw@example.com")).await.unwrap();

        let err = service
            .change_password(&profile.id, "not-my-password1", "newpass123")
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Api { status: 401, .. }));

        service
            .change_password(&profile.id, "hopper1906", "newpass123")
            .await
            .unwrap();
        assert!(service.authenticate("pw@example.com", "newpass123").await.is_ok());
        assert!(service.authenticate("pw@example.com", "hopper1906").await.is_err());
    }

    #[tokio::test]
    async fn test_emails_match_regardless_of_case() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        let profile = service.create_user(new_user(" Ada@Example.com ")).await.unwrap();
        assert_eq!(profile.email, "ada@example.com");

        assert!(service.authenticate("Ada@Example.com", "hopper1906").await.is_ok());
        assert!(service.authenticate("ada@example.com", "hopper1906").await.is_ok());

        let err = service.create_user(new_user("ADA@example.com")).await.unwrap_err();
        assert_eq!(classify(&err, false).status_code, 409);
    }

    #[tokio::test]
    async fn test_seed_admin_email_is_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _) = service(&temp_dir);

        assert!(service.ensure_admin("Root@Example.com", "rootpass123").await.unwrap());
        assert!(!service.ensure_admin("root@example.com", "rootpass123").await.unwrap());

        let err = service.create_user(new_user("root@example.com")).await.unwrap_err();
        assert_eq!(classify(&err, false).status_code, 409);
    }
}
