//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password, returning a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let row = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        let valid = match row.password.as_deref() {
            Some(hash) => verify_password(password, hash)?,
            None => false,
        };
        if !valid {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let user = User::from(row);
        let token = self.create_token_for_user(&user)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    /// Create JWT token for a user
    pub fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// List all users
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user. Only administrators may create librarians.
    pub async fn create_user(&self, user: CreateUser, caller: Option<&UserClaims>) -> AppResult<User> {
        user.validate()?;

        if user.is_librarian && !caller.map(|c| c.is_admin).unwrap_or(false) {
            return Err(AppError::Authorization(
                "Administrator privileges required to create a librarian".to_string(),
            ));
        }

        if self.repository.users.username_exists(&user.username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = user.password.as_deref().map(hash_password).transpose()?;
        let created = self
            .repository
            .users
            .create(&user, password_hash.as_deref(), false)
            .await?;

        tracing::info!(user_id = created.id, username = %created.username, "User created");
        Ok(created)
    }

    /// Grant or revoke the librarian flag
    pub async fn set_librarian(&self, id: i32, is_librarian: bool) -> AppResult<User> {
        let user = self.repository.users.set_librarian(id, is_librarian).await?;
        tracing::info!(user_id = id, is_librarian, "Librarian flag updated");
        Ok(user)
    }

    /// Create the configured administrator account if it does not exist yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(username), Some(password)) =
            (&self.config.admin_username, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.repository.users.username_exists(username).await? {
            return Ok(());
        }

        let admin = CreateUser {
            username: username.clone(),
            email: format!("{}@localhost", username),
            first_name: "Library".to_string(),
            last_name: "Administrator".to_string(),
            is_librarian: true,
            password: Some(password.clone()),
        };
        let hash = hash_password(password)?;
        let created = self.repository.users.create(&admin, Some(&hash), true).await?;

        tracing::info!(user_id = created.id, username = %created.username, "Administrator account created");
        Ok(())
    }
}

/// Hash a password with argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
