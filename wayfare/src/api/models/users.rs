//! API request/response models for users.

use super::{pagination::Pagination, validation};
use crate::config::PasswordConfig;
use crate::db::models::users::UserDBResponse;
use crate::errors::Result;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub password: String,
    pub image: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserCreate {
    pub fn validate(&self, passwords: &PasswordConfig) -> Result<()> {
        validation::email(&self.email)?;
        validation::min_chars("Name", &self.name, 2)?;
        crate::auth::password::check_length(&self.password, passwords.min_length, passwords.max_length)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
    /// Only admins may change this
    pub is_admin: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self, passwords: &PasswordConfig) -> Result<()> {
        if let Some(name) = &self.name {
            validation::min_chars("Name", name, 2)?;
        }
        if let Some(password) = &self.password {
            crate::auth::password::check_length(password, passwords.min_length, passwords.max_length)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub auth_source: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The compact form embedded in other resources (authors, reviewers, participants)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub image: Option<String>,
}

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on email or name
    pub search: Option<String>,
}

/// The authenticated user behind a request, taken from the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.name,
            image: db.image,
            auth_source: db.auth_source,
            is_admin: db.is_admin,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            name: db.name.clone(),
            is_admin: db.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str, name: &str, password: &str) -> UserCreate {
        UserCreate {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            image: None,
            is_admin: false,
        }
    }

    #[test]
    fn test_create_validation() {
        let passwords = PasswordConfig::default();
        assert!(create("ana@example.com", "Ana", "secret1").validate(&passwords).is_ok());
        assert!(create("not-an-email", "Ana", "secret1").validate(&passwords).is_err());
        assert!(create("ana@example.com", "A", "secret1").validate(&passwords).is_err());
        assert!(create("ana@example.com", "Ana", "short").validate(&passwords).is_err());
    }

    #[test]
    fn test_update_validation_only_checks_supplied_fields() {
        let passwords = PasswordConfig::default();
        assert!(UserUpdate::default().validate(&passwords).is_ok());
        let update = UserUpdate {
            password: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(update.validate(&passwords).is_err());
    }
}
