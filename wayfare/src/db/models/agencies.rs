//! Database models for travel agencies.

use crate::types::AgencyId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for registering an agency
#[derive(Debug, Clone)]
pub struct AgencyCreateDBRequest {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Database request for updating an agency profile
#[derive(Debug, Clone, Default)]
pub struct AgencyUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub verified: Option<bool>,
}

/// Database response for an agency
#[derive(Debug, Clone, FromRow)]
pub struct AgencyDBResponse {
    pub id: AgencyId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
