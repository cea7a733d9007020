//! API request/response models for locations and favourites.

use super::{pagination::Pagination, validation};
use crate::db::models::locations::{FavoriteLocationDBResponse, LocationCreateDBRequest, LocationDBResponse, LocationUpdateDBRequest};
use crate::errors::Result;
use crate::types::LocationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationCreate {
    pub name: String,
    pub description: String,
    pub category: String,
    pub province: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    if let Some(lat) = latitude {
        validation::in_range("Latitude", lat, -90.0, 90.0)?;
    }
    if let Some(lng) = longitude {
        validation::in_range("Longitude", lng, -180.0, 180.0)?;
    }
    Ok(())
}

impl LocationCreate {
    pub fn validate(&self) -> Result<()> {
        validation::min_chars("Name", &self.name, 2)?;
        validation::min_chars("Description", &self.description, 1)?;
        validation::min_chars("Category", &self.category, 1)?;
        validation::min_chars("Province", &self.province, 1)?;
        check_coordinates(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Option<Vec<String>>,
}

impl LocationUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validation::min_chars("Name", name, 2)?;
        }
        check_coordinates(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub province: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Name and province, embedded in blogs and events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: LocationId,
    pub name: String,
    pub province: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteLocationResponse {
    pub favorited_at: DateTime<Utc>,
    pub location: LocationResponse,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListLocationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
    pub category: Option<String>,
    pub province: Option<String>,
    /// Case-insensitive substring match on name
    pub search: Option<String>,
}

impl From<LocationCreate> for LocationCreateDBRequest {
    fn from(api: LocationCreate) -> Self {
        Self {
            name: api.name.trim().to_string(),
            description: api.description,
            category: api.category,
            province: api.province,
            district: api.district,
            address: api.address,
            latitude: api.latitude,
            longitude: api.longitude,
            images: api.images,
        }
    }
}

impl From<LocationUpdate> for LocationUpdateDBRequest {
    fn from(api: LocationUpdate) -> Self {
        Self {
            name: api.name.map(|n| n.trim().to_string()),
            description: api.description,
            category: api.category,
            province: api.province,
            district: api.district,
            address: api.address,
            latitude: api.latitude,
            longitude: api.longitude,
            images: api.images,
        }
    }
}

impl From<LocationDBResponse> for LocationResponse {
    fn from(db: LocationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            category: db.category,
            province: db.province,
            district: db.district,
            address: db.address,
            latitude: db.latitude,
            longitude: db.longitude,
            images: db.images,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<FavoriteLocationDBResponse> for FavoriteLocationResponse {
    fn from(db: FavoriteLocationDBResponse) -> Self {
        Self {
            favorited_at: db.favorited_at,
            location: db.location.into(),
        }
    }
}
