//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Internal row structure, including the password hash
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: Option<String>,
    pub is_librarian: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_librarian: row.is_librarian,
            is_admin: row.is_admin,
        }
    }
}

/// User summary as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_librarian: bool,
    pub is_admin: bool,
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 150, message = "First name must be 1 to 150 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Last name must be 1 to 150 characters"))]
    pub last_name: String,
    /// Only an administrator may create librarians
    #[serde(default)]
    pub is_librarian: bool,
    /// Optional password; users without one cannot log in
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Update librarian flag request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLibrarian {
    pub is_librarian: bool,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_librarian: bool,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Build claims for a user, valid for `hours`. Huge values clamp to the
    /// far future.
    pub fn for_user(user: &User, hours: u64) -> Self {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(hours).unwrap_or(i64::MAX).saturating_mul(3600);
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_librarian: user.is_librarian,
            is_admin: user.is_admin,
            exp: now.saturating_add(lifetime),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Librarians and administrators both count as staff
    pub fn is_staff(&self) -> bool {
        self.is_librarian || self.is_admin
    }

    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Librarian privileges required".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow access to a user's own data, or to anyone's for staff
    pub fn require_self_or_librarian(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Cannot access another user's records".to_string(),
            ))
        }
    }
}
