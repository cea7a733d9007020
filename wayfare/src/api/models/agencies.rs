//! API request/response models for travel agencies.

use super::validation;
use crate::db::models::agencies::AgencyDBResponse;
use crate::errors::Result;
use crate::types::AgencyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencyRegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

impl AgencyRegisterRequest {
    pub fn validate(&self, min_password: usize, max_password: usize) -> Result<()> {
        validation::min_chars("Name", &self.name, 2)?;
        validation::email(&self.email)?;
        crate::auth::password::check_length(&self.password, min_password, max_password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencyLoginRequest {
    pub email: String,
    pub password: String,
}

/// Public agency profile. The password hash never leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AgencyId,
    pub name: String,
    pub email: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Embedded in tour listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgencySummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: AgencyId,
    pub name: String,
    pub logo: Option<String>,
    pub verified: bool,
}

/// The authenticated agency behind a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentAgency {
    #[schema(value_type = String, format = "uuid")]
    pub id: AgencyId,
    pub email: String,
    pub name: String,
}

impl From<AgencyDBResponse> for AgencyResponse {
    fn from(db: AgencyDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            description: db.description,
            logo: db.logo,
            website: db.website,
            phone_number: db.phone_number,
            address: db.address,
            verified: db.verified,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&AgencyDBResponse> for CurrentAgency {
    fn from(db: &AgencyDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email.clone(),
            name: db.name.clone(),
        }
    }
}
