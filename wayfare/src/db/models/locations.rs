//! Database models for locations and favourites.

use crate::types::{LocationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct LocationCreateDBRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub province: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationUpdateDBRequest {
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

#[derive(Debug, Clone, FromRow)]
pub struct LocationDBResponse {
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

/// A favourite joined with the location it points at
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteLocationDBResponse {
    pub user_id: UserId,
    pub favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub location: LocationDBResponse,
}
