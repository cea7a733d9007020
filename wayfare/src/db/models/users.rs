//! Database models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub auth_source: String,
    pub is_admin: bool,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub auth_source: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
